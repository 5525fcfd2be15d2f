//! `data:` URI helpers for photo payloads.
//!
//! Payloads are standard padded base64, so the binary size of a payload is
//! recoverable as `floor(base64_len * 3 / 4)` (off by at most the padding).

use std::{error::Error, fmt};

use base64ct::{Base64, Encoding};

pub const JPEG_MIME: &str = "image/jpeg";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataUriError {
    /// No `,` separating the header from the data.
    MissingData,
    /// The data section is not valid base64.
    InvalidBase64,
}

impl fmt::Display for DataUriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataUriError::MissingData => write!(f, "data URI has no data section"),
            DataUriError::InvalidBase64 => write!(f, "data URI is not valid base64"),
        }
    }
}

impl Error for DataUriError {}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", Base64::encode_string(bytes))
}

/// Returns the text after the first comma.
pub fn data_section(uri: &str) -> Result<&str, DataUriError> {
    uri.split_once(',')
        .map(|(_, data)| data)
        .ok_or(DataUriError::MissingData)
}

pub fn decode(uri: &str) -> Result<Vec<u8>, DataUriError> {
    let data = data_section(uri)?;
    Base64::decode_vec(data.trim()).map_err(|_| DataUriError::InvalidBase64)
}

/// Approximate binary size of the payload carried by `uri`.
pub fn approximate_size(uri: &str) -> u64 {
    let len = data_section(uri).map(str::len).unwrap_or(uri.len()) as u64;
    len * 3 / 4
}
