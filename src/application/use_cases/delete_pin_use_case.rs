//! Pin removal.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::entities::Pin;
use crate::domain::errors::AlbumError;
use crate::domain::ports::{ImageCachePort, PinStorePort};

/// Deletes a pin, its photo records, and their cached bytes.
#[derive(Clone)]
pub struct DeletePinUseCase {
    cache: Arc<dyn ImageCachePort>,
    store: Arc<dyn PinStorePort>,
}

impl DeletePinUseCase {
    /// Creates the use case.
    #[must_use]
    pub fn new(cache: Arc<dyn ImageCachePort>, store: Arc<dyn PinStorePort>) -> Self {
        Self { cache, store }
    }

    /// Deletes `pin` from the store and evicts every photo it owned.
    /// Returns the number of photos removed.
    ///
    /// Every eviction is attempted even if one fails.
    ///
    /// # Errors
    /// Returns the store error, or the first eviction error.
    pub async fn execute(&self, pin: &Pin) -> Result<usize, AlbumError> {
        self.store.delete(pin.id()).await?;

        let photos = pin.take_photos();
        let mut first_error = None;
        for record in &photos {
            if let Err(e) = self.cache.evict(record.cache_key()).await {
                warn!(photo_id = %record.id(), error = %e, "Failed to evict photo of deleted pin");
                first_error.get_or_insert(e);
            }
        }

        info!(pin_id = %pin.id(), photos = photos.len(), "Deleted pin");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(photos.len()),
        }
    }
}
