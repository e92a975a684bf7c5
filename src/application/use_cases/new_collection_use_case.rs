//! Replaces a pin's album with a freshly searched page.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::services::PageSelector;
use crate::domain::entities::{PhotoMetadata, PhotoRecord, Pin};
use crate::domain::errors::{AlbumError, SearchError};
use crate::domain::ports::{ImageCachePort, PhotoSearchPort, PinStorePort};
use crate::domain::services::{DEFAULT_HALF_HEIGHT, DEFAULT_HALF_WIDTH, compute_region};

/// Result of a collection load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The album was replaced.
    Populated {
        /// Photos in the new album.
        photos: usize,
        /// Result page that was loaded.
        page: u32,
    },
    /// A search for this pin is already running; nothing was done.
    InProgress,
}

/// Runs page selection and search for a pin, then swaps in the new album.
#[derive(Clone)]
pub struct NewCollectionUseCase {
    selector: Arc<PageSelector>,
    search: Arc<dyn PhotoSearchPort>,
    cache: Arc<dyn ImageCachePort>,
    store: Arc<dyn PinStorePort>,
    half_width: f64,
    half_height: f64,
}

impl NewCollectionUseCase {
    /// Creates the use case with the default search box size.
    #[must_use]
    pub fn new(
        selector: Arc<PageSelector>,
        search: Arc<dyn PhotoSearchPort>,
        cache: Arc<dyn ImageCachePort>,
        store: Arc<dyn PinStorePort>,
    ) -> Self {
        Self {
            selector,
            search,
            cache,
            store,
            half_width: DEFAULT_HALF_WIDTH,
            half_height: DEFAULT_HALF_HEIGHT,
        }
    }

    /// Sets the search box half-size in degrees.
    #[must_use]
    pub const fn with_box_size(mut self, half_width: f64, half_height: f64) -> Self {
        self.half_width = half_width;
        self.half_height = half_height;
        self
    }

    /// Loads a random result page for `pin` and replaces its album.
    ///
    /// On failure the album is left untouched.
    ///
    /// # Errors
    /// Returns `AlbumError::Search` if page selection or search fails, or
    /// `AlbumError::Store` if the updated pin cannot be saved.
    pub async fn execute(&self, pin: &Arc<Pin>) -> Result<SearchOutcome, AlbumError> {
        let (outcome, removed) = {
            let Some(_guard) = pin.try_begin_search() else {
                debug!(pin_id = %pin.id(), "Search already in progress");
                return Ok(SearchOutcome::InProgress);
            };

            let (page, metadata) = self.search_page(pin).await.inspect_err(|e| {
                if e.is_user_facing() {
                    info!(pin_id = %pin.id(), reason = %e, "No photos for pin");
                } else {
                    warn!(pin_id = %pin.id(), error = %e, "Photo search failed");
                }
            })?;

            let photos = metadata.len();
            let removed = pin.replace_photos(metadata);
            (SearchOutcome::Populated { photos, page }, removed)
        };

        self.evict_replaced(&removed).await;
        self.store.save(pin).await?;

        info!(pin_id = %pin.id(), outcome = ?outcome, "Loaded new collection");
        Ok(outcome)
    }

    async fn search_page(&self, pin: &Pin) -> Result<(u32, Vec<PhotoMetadata>), SearchError> {
        let region = compute_region(pin.coordinate(), self.half_width, self.half_height);
        let page = self.selector.select_page(&region).await?;
        let metadata = self
            .search
            .search(&region, page, self.selector.per_page())
            .await?;
        Ok((page, metadata))
    }

    async fn evict_replaced(&self, removed: &[Arc<PhotoRecord>]) {
        for record in removed.iter().filter(|r| r.is_orphaned()) {
            if let Err(e) = self.cache.evict(record.cache_key()).await {
                warn!(photo_id = %record.id(), error = %e, "Failed to evict replaced photo");
            }
        }
    }
}
