//! Image cache error types.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Errors that can occur during cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The key is empty.
    #[error("invalid cache key: {0:?}")]
    InvalidKey(String),
    /// I/O error during cache operation.
    #[error("IO error: {0}")]
    Io(String),
}
