//! Removal of single photos from an album.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::entities::{PhotoId, Pin};
use crate::domain::errors::AlbumError;
use crate::domain::ports::{ImageCachePort, PinStorePort};

/// Deletes one photo record together with its cached bytes.
#[derive(Clone)]
pub struct DeletePhotoUseCase {
    cache: Arc<dyn ImageCachePort>,
    store: Arc<dyn PinStorePort>,
}

impl DeletePhotoUseCase {
    /// Creates the use case.
    #[must_use]
    pub fn new(cache: Arc<dyn ImageCachePort>, store: Arc<dyn PinStorePort>) -> Self {
        Self { cache, store }
    }

    /// Removes `photo_id` from `pin`'s album and evicts its cache entry.
    ///
    /// The record leaves the album before its entry is evicted, so a
    /// download still running for it discards its bytes.
    ///
    /// # Errors
    /// Returns `PhotoNotFound` if the album has no such photo, the store
    /// error, or the eviction error. The record is gone from the album and
    /// the store even when eviction fails.
    pub async fn execute(&self, pin: &Pin, photo_id: &PhotoId) -> Result<(), AlbumError> {
        let record = pin
            .remove_photo(photo_id)
            .ok_or_else(|| AlbumError::PhotoNotFound(photo_id.clone()))?;

        let evicted = self.cache.evict(record.cache_key()).await;
        if let Err(e) = &evicted {
            warn!(photo_id = %photo_id, error = %e, "Failed to evict deleted photo");
        }
        self.store.save(pin).await?;
        evicted?;

        debug!(pin_id = %pin.id(), photo_id = %photo_id, "Deleted photo");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{GeoPoint, PhotoMetadata};
    use crate::domain::ports::mocks::{MemoryImageCache, MemoryPinStore};

    #[tokio::test]
    async fn test_delete_evicts_cache_entry() {
        let cache = Arc::new(MemoryImageCache::new());
        let store = Arc::new(MemoryPinStore::new());
        let pin = Pin::new(GeoPoint::new(1.0, 1.0).unwrap());
        pin.replace_photos(vec![
            PhotoMetadata::new("a", "ua"),
            PhotoMetadata::new("b", "ub"),
        ]);
        cache.put("a", Some(b"bytes".as_slice())).await.unwrap();

        DeletePhotoUseCase::new(cache.clone(), store.clone())
            .execute(&pin, &PhotoId::from("a"))
            .await
            .unwrap();

        assert!(cache.get("a").await.is_none());
        assert_eq!(pin.photo_count(), 1);
        assert_eq!(store.saved_photos(pin.id()), Some(vec![PhotoId::from("b")]));
    }

    #[tokio::test]
    async fn test_unknown_photo() {
        let pin = Pin::new(GeoPoint::new(1.0, 1.0).unwrap());
        let err = DeletePhotoUseCase::new(
            Arc::new(MemoryImageCache::new()),
            Arc::new(MemoryPinStore::new()),
        )
        .execute(&pin, &PhotoId::from("nope"))
        .await
        .unwrap_err();

        assert!(matches!(err, AlbumError::PhotoNotFound(id) if id.as_str() == "nope"));
    }

    #[tokio::test]
    async fn test_cache_failure_is_reported_after_removal() {
        let store = Arc::new(MemoryPinStore::new());
        let pin = Pin::new(GeoPoint::new(1.0, 1.0).unwrap());
        pin.replace_photos(vec![PhotoMetadata::new("a", "ua")]);
        let record = pin.find_photo(&PhotoId::from("a")).unwrap();

        let err = DeletePhotoUseCase::new(Arc::new(MemoryImageCache::failing()), store.clone())
            .execute(&pin, &PhotoId::from("a"))
            .await
            .unwrap_err();

        assert!(matches!(err, AlbumError::Cache(_)));
        assert_eq!(pin.photo_count(), 0);
        assert!(record.is_removed());
        assert_eq!(store.saved_photos(pin.id()), Some(vec![]));
    }
}
