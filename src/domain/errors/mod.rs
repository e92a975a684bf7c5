//! Domain error types.

mod album_error;
mod cache_error;
mod fetch_error;
mod search_error;
mod store_error;
mod transport_error;

pub use album_error::AlbumError;
pub use cache_error::{CacheError, CacheResult};
pub use fetch_error::FetchError;
pub use search_error::SearchError;
pub use store_error::StoreError;
pub use transport_error::TransportError;
