//! Image fetch error types.

use thiserror::Error;

use super::{CacheError, TransportError};

/// Failures while materializing one photo's image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The download did not complete or returned a non-2xx status.
    #[error("image download failed: {0}")]
    Transport(String),

    /// The response carried no bytes.
    #[error("image download returned no data")]
    NoData,

    /// The bytes are not a recognizable image format.
    #[error("downloaded data is not an image")]
    NotAnImage,

    /// The bytes could not be written to the cache.
    #[error("failed to cache image: {0}")]
    Cache(#[from] CacheError),
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}
