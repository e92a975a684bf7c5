//! Photo search port definition.

use async_trait::async_trait;

use crate::domain::entities::{PhotoMetadata, SearchRegion};
use crate::domain::errors::SearchError;

/// Port for the external photo search provider.
#[async_trait]
pub trait PhotoSearchPort: Send + Sync {
    /// Reads the provider's page count for `region` at `per_page` results
    /// per page. `None` when the provider omits the field.
    async fn page_count(
        &self,
        region: &SearchRegion,
        per_page: u32,
    ) -> Result<Option<u32>, SearchError>;

    /// Fetches one page of photo metadata, in provider order.
    ///
    /// An empty page is reported as [`SearchError::NoPhotosFound`].
    async fn search(
        &self,
        region: &SearchRegion,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PhotoMetadata>, SearchError>;
}
