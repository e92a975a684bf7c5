//! Random result page selection.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::domain::entities::SearchRegion;
use crate::domain::errors::SearchError;
use crate::domain::ports::PhotoSearchPort;

/// Page size of the result count request.
const COUNT_PAGE_SIZE: u32 = 1;

/// Picks a random result page for a region so repeated searches show
/// different photos.
pub struct PageSelector {
    search: Arc<dyn PhotoSearchPort>,
    per_page: u32,
    max_page: u32,
    rng: Mutex<StdRng>,
}

impl PageSelector {
    /// Creates a selector seeded from the OS.
    #[must_use]
    pub fn new(search: Arc<dyn PhotoSearchPort>, per_page: u32, max_page: u32) -> Self {
        Self::with_rng(search, per_page, max_page, StdRng::from_os_rng())
    }

    /// Creates a selector drawing from `rng`.
    #[must_use]
    pub fn with_rng(
        search: Arc<dyn PhotoSearchPort>,
        per_page: u32,
        max_page: u32,
        rng: StdRng,
    ) -> Self {
        Self {
            search,
            per_page: per_page.max(1),
            max_page: max_page.max(1),
            rng: Mutex::new(rng),
        }
    }

    /// Results per page the selected page refers to.
    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Highest page that can be returned for `total` results counted at one per page.
    #[must_use]
    pub const fn page_limit(&self, total: u32) -> u32 {
        let pages = total.div_ceil(self.per_page);
        if pages < self.max_page { pages } else { self.max_page }
    }

    /// Counts the region's result count and draws a page in `[1, limit]`.
    ///
    /// # Errors
    /// Returns `NoResults` when the provider reports zero or no pages, or
    /// the count request's own search error.
    pub async fn select_page(&self, region: &SearchRegion) -> Result<u32, SearchError> {
        let total = self.search.page_count(region, COUNT_PAGE_SIZE).await?;

        let total = match total {
            Some(total) if total > 0 => total,
            _ => {
                info!(bbox = %region, "No photos around this location");
                return Err(SearchError::NoResults);
            }
        };

        let limit = self.page_limit(total);
        let page = self.rng.lock().random_range(1..=limit);

        debug!(total = total, limit = limit, page = page, "Selected result page");
        Ok(page)
    }
}

impl std::fmt::Debug for PageSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageSelector")
            .field("per_page", &self.per_page)
            .field("max_page", &self.max_page)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::GeoPoint;
    use crate::domain::ports::mocks::MockPhotoSearch;
    use crate::domain::services::compute_region;
    use test_case::test_case;

    fn region() -> SearchRegion {
        compute_region(GeoPoint::new(35.0, 139.0).unwrap(), 1.0, 1.0)
    }

    fn selector(pages: Option<u32>, per_page: u32, seed: u64) -> PageSelector {
        PageSelector::with_rng(
            Arc::new(MockPhotoSearch::with_pages(pages)),
            per_page,
            40,
            StdRng::seed_from_u64(seed),
        )
    }

    #[test_case(None ; "absent")]
    #[test_case(Some(0) ; "zero")]
    #[tokio::test]
    async fn test_no_pages_is_no_results(pages: Option<u32>) {
        let err = selector(pages, 21, 1).select_page(&region()).await.unwrap_err();
        assert_eq!(err, SearchError::NoResults);
    }

    #[test_case(1, 1, 1 ; "single result")]
    #[test_case(21, 21, 1 ; "exactly one page")]
    #[test_case(22, 21, 2 ; "partial second page")]
    #[test_case(5000, 21, 40 ; "capped by provider")]
    #[test_case(30, 1, 30 ; "below cap")]
    fn test_page_limit(total: u32, per_page: u32, expected: u32) {
        assert_eq!(selector(Some(total), per_page, 0).page_limit(total), expected);
    }

    #[tokio::test]
    async fn test_page_stays_in_bounds() {
        for seed in 0..200 {
            let page = selector(Some(10_000), 21, seed)
                .select_page(&region())
                .await
                .unwrap();
            assert!((1..=40).contains(&page), "page {page} out of range");
        }

        for seed in 0..50 {
            let page = selector(Some(3), 1, seed).select_page(&region()).await.unwrap();
            assert!((1..=3).contains(&page));
        }
    }

    #[tokio::test]
    async fn test_single_page_always_first() {
        let selector = selector(Some(1), 21, 99);
        for _ in 0..10 {
            assert_eq!(selector.select_page(&region()).await, Ok(1));
        }
    }

    #[tokio::test]
    async fn test_same_seed_same_page() {
        let a = selector(Some(800), 21, 7).select_page(&region()).await;
        let b = selector(Some(800), 21, 7).select_page(&region()).await;
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_count_error_propagates() {
        let search = Arc::new(MockPhotoSearch::with_pages(Some(10)));
        search.fail_count_request(SearchError::BadStatus(500));
        let selector =
            PageSelector::with_rng(search, 21, 40, StdRng::seed_from_u64(0));

        assert_eq!(
            selector.select_page(&region()).await,
            Err(SearchError::BadStatus(500))
        );
    }
}
