//! Domain layer with core business entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;
/// Serde utilities.
pub mod serde_utils;
/// Pure domain services.
pub mod services;

pub use entities::{GeoPoint, PhotoId, PhotoMetadata, PhotoRecord, Pin, PinId, SearchRegion};
pub use errors::{AlbumError, CacheError, FetchError, SearchError, StoreError};
pub use ports::{HttpTransport, ImageCachePort, PhotoSearchPort, PinStorePort};
