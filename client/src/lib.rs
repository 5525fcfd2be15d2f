//! Field-report client: photo compression and staging, and the submission
//! pipeline that delivers a report to the jobsite endpoint.

pub mod compress;
pub mod error;
pub mod form;
pub mod orchestrator;
pub mod remote;
pub mod session;
pub mod staging;

pub use error::{Error, Result};
