//! Pin persistence port definition.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::entities::{Pin, PinId};
use crate::domain::errors::StoreError;

/// Port for the local structured store holding pins and their albums.
#[async_trait]
pub trait PinStorePort: Send + Sync {
    /// Loads every persisted pin with its album.
    async fn load_all(&self) -> Result<Vec<Arc<Pin>>, StoreError>;

    /// Inserts or updates `pin` and its album.
    async fn save(&self, pin: &Pin) -> Result<(), StoreError>;

    /// Deletes a pin and, with it, its photo records.
    async fn delete(&self, id: PinId) -> Result<(), StoreError>;
}
