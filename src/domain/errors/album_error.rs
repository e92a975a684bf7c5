//! Errors surfaced by album use cases.

use thiserror::Error;

use super::{CacheError, SearchError, StoreError};
use crate::domain::entities::PhotoId;

/// Failure of an album-level operation.
#[derive(Debug, Error)]
pub enum AlbumError {
    /// Page selection or search failed; the album is unchanged.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Persisting the pin failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Evicting cached bytes failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The photo is not part of the pin's album.
    #[error("photo {0} is not in this album")]
    PhotoNotFound(PhotoId),
}

impl AlbumError {
    /// Returns whether the error should be shown as "try a different location".
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        match self {
            Self::Search(e) => e.is_user_facing(),
            _ => false,
        }
    }
}
