//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Photo search provider client.
pub mod flickr;
/// HTTP transport.
pub mod http;
/// On-disk image cache.
pub mod image;
/// Pin persistence.
pub mod storage;

pub use config::{AppConfig, CliArgs, Command, LogLevel, StateConfig, StorageManager};
pub use flickr::{FLICKR_API_BASE, FlickrClient};
pub use http::ReqwestTransport;
pub use image::{DEFAULT_MAX_CACHE_SIZE, DiskImageCache};
pub use storage::JsonPinStore;
