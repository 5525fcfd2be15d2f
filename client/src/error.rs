use std::{io, path::PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{name} is not a readable image: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("could not re-encode {name}: {source}")]
    Encode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("background task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error! status: {0}")]
    BadStatus(u16),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    RemoteFailure(String),

    #[error("{0} is required")]
    Validation(&'static str),

    #[error("no staged photo at index {index} ({len} staged)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Maximum {max} photos allowed ({staged} staged, {selected} selected)")]
    TooManyPhotos {
        staged: usize,
        selected: usize,
        max: usize,
    },
}

impl Error {
    /// Transport-level failures: the request never produced a usable answer.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::BadStatus(_) | Self::MalformedResponse(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::MalformedResponse(value.to_string())
    }
}
