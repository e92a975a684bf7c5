//! Image cache infrastructure.

pub mod disk_cache;

pub use disk_cache::{DEFAULT_MAX_CACHE_SIZE, DiskImageCache};
