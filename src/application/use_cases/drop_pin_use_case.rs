//! Pin drop and relocation.

use std::sync::Arc;

use tracing::{debug, info};

use super::new_collection_use_case::{NewCollectionUseCase, SearchOutcome};
use crate::domain::entities::{GeoPoint, Pin};
use crate::domain::errors::{AlbumError, StoreError};
use crate::domain::ports::PinStorePort;

/// A newly placed pin and the result of loading its first album.
#[derive(Debug)]
pub struct DroppedPin {
    /// The saved pin.
    pub pin: Arc<Pin>,
    /// Album load result. A failed search still leaves the pin in place.
    pub album: Result<SearchOutcome, AlbumError>,
}

/// Creates pins and loads their first album.
#[derive(Clone)]
pub struct DropPinUseCase {
    store: Arc<dyn PinStorePort>,
    new_collection: NewCollectionUseCase,
}

impl DropPinUseCase {
    /// Creates the use case.
    #[must_use]
    pub fn new(store: Arc<dyn PinStorePort>, new_collection: NewCollectionUseCase) -> Self {
        Self {
            store,
            new_collection,
        }
    }

    /// Places a pin at `point`, saves it, and searches for photos around it.
    ///
    /// # Errors
    /// Returns `StoreError` if the new pin cannot be saved.
    pub async fn execute(&self, point: GeoPoint) -> Result<DroppedPin, StoreError> {
        let pin = Pin::new(point);
        self.store.save(&pin).await?;
        info!(pin_id = %pin.id(), location = %point, "Dropped pin");

        let album = self.new_collection.execute(&pin).await;
        Ok(DroppedPin { pin, album })
    }

    /// Moves `pin` to `point` and reloads its album for the new location.
    ///
    /// # Errors
    /// Returns `AlbumError` if the moved pin cannot be saved or the new search fails.
    pub async fn relocate(
        &self,
        pin: &Arc<Pin>,
        point: GeoPoint,
    ) -> Result<SearchOutcome, AlbumError> {
        debug!(pin_id = %pin.id(), from = %pin.coordinate(), to = %point, "Moving pin");
        pin.relocate(point);
        self.store.save(pin).await?;

        self.new_collection.execute(pin).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::PageSelector;
    use crate::domain::entities::PhotoMetadata;
    use crate::domain::errors::SearchError;
    use crate::domain::ports::mocks::{MemoryImageCache, MemoryPinStore, MockPhotoSearch};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn use_case(search: Arc<MockPhotoSearch>, store: Arc<MemoryPinStore>) -> DropPinUseCase {
        let selector = Arc::new(PageSelector::with_rng(
            search.clone(),
            21,
            40,
            StdRng::seed_from_u64(11),
        ));
        let collection = NewCollectionUseCase::new(
            selector,
            search,
            Arc::new(MemoryImageCache::new()),
            store.clone(),
        );
        DropPinUseCase::new(store, collection)
    }

    #[tokio::test]
    async fn test_drop_pin_loads_album() {
        let search = Arc::new(MockPhotoSearch::with_pages(Some(21)));
        search.push_result(Ok(vec![PhotoMetadata::new("1", "https://img.example/1.jpg")]));
        let store = Arc::new(MemoryPinStore::new());

        let dropped = use_case(search, store.clone())
            .execute(GeoPoint::new(41.9, 12.5).unwrap())
            .await
            .unwrap();

        assert_eq!(
            dropped.album.unwrap(),
            SearchOutcome::Populated { photos: 1, page: 1 }
        );
        assert_eq!(dropped.pin.photo_count(), 1);
        assert_eq!(store.save_count(), 2);
        assert!(!dropped.pin.fetch_in_progress());
    }

    #[tokio::test]
    async fn test_drop_pin_keeps_pin_without_photos() {
        let search = Arc::new(MockPhotoSearch::with_pages(None));
        let store = Arc::new(MemoryPinStore::new());

        let dropped = use_case(search, store.clone())
            .execute(GeoPoint::new(0.0, -160.0).unwrap())
            .await
            .unwrap();

        assert!(matches!(
            dropped.album,
            Err(AlbumError::Search(SearchError::NoResults))
        ));
        assert_eq!(store.saved_photos(dropped.pin.id()), Some(Vec::new()));
        assert!(!dropped.pin.fetch_in_progress());
    }

    #[tokio::test]
    async fn test_relocate_reloads_album() {
        let search = Arc::new(MockPhotoSearch::with_pages(Some(5)));
        search.push_result(Ok(vec![PhotoMetadata::new("old", "u")]));
        search.push_result(Ok(vec![
            PhotoMetadata::new("n1", "u1"),
            PhotoMetadata::new("n2", "u2"),
        ]));
        let store = Arc::new(MemoryPinStore::new());
        let use_case = use_case(search, store);

        let dropped = use_case
            .execute(GeoPoint::new(10.0, 10.0).unwrap())
            .await
            .unwrap();
        let target = GeoPoint::new(-10.0, 20.0).unwrap();

        let outcome = use_case.relocate(&dropped.pin, target).await.unwrap();

        assert!(matches!(outcome, SearchOutcome::Populated { photos: 2, .. }));
        assert_eq!(dropped.pin.coordinate(), target);
        assert!(dropped.pin.find_photo(&"old".into()).is_none());
    }
}
