pub mod data;
pub mod data_uri;
pub mod materials;
pub mod payloads;

pub use materials::parse_materials_list;
