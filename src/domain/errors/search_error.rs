//! Photo search error types.

use thiserror::Error;

use super::TransportError;

/// Failures of page selection and photo search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The request did not complete.
    #[error("search request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-2xx status.
    #[error("search returned HTTP {0}")]
    BadStatus(u16),

    /// The body was not valid JSON.
    #[error("search response is not valid JSON: {0}")]
    MalformedResponse(String),

    /// The provider reported a failure (`stat` was not `ok`).
    #[error("photo provider returned an error: {0}")]
    ProviderError(String),

    /// A required field was missing or had the wrong type.
    #[error("unexpected search response shape: {0}")]
    SchemaMismatch(String),

    /// The region has no photos at all.
    #[error("no photos exist around this location, try a different location")]
    NoResults,

    /// The selected page came back empty.
    #[error("no photos found, try a different location")]
    NoPhotosFound,
}

impl SearchError {
    /// Creates a schema mismatch error.
    #[must_use]
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaMismatch(message.into())
    }

    /// Returns whether the error is an expected, user-facing outcome
    /// rather than a system failure.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(self, Self::NoResults | Self::NoPhotosFound)
    }

    /// Returns whether retrying the same search may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::BadStatus(_) | Self::NoResults | Self::NoPhotosFound
        )
    }
}

impl From<TransportError> for SearchError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_classification() {
        assert!(SearchError::NoResults.is_user_facing());
        assert!(SearchError::NoPhotosFound.is_user_facing());
        assert!(!SearchError::BadStatus(500).is_user_facing());
        assert!(!SearchError::schema("photos").is_user_facing());
    }

    #[test]
    fn test_transport_conversion_keeps_detail() {
        let err = SearchError::from(TransportError::Connect("dns".to_string()));
        assert_eq!(err, SearchError::Transport("failed to connect: dns".to_string()));
        assert!(err.is_recoverable());
    }
}
