//! Pin store error types.

use thiserror::Error;

use crate::domain::entities::PinId;

/// Errors raised by pin persistence.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum StoreError {
    #[error("pin store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pin store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("pin not found: {0}")]
    NotFound(PinId),

    #[error("corrupt pin record: {0}")]
    Corrupt(String),
}
