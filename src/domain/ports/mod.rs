//! Port definitions.

mod http_transport_port;
mod image_cache_port;
mod photo_search_port;
mod pin_store_port;

pub use http_transport_port::{HttpResponse, HttpTransport};
pub use image_cache_port::ImageCachePort;
pub use photo_search_port::PhotoSearchPort;
pub use pin_store_port::PinStorePort;
