//! Port definition for image caching.

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::errors::CacheResult;

/// Keyed store for image bytes.
/// Implementations must be thread-safe.
#[async_trait]
pub trait ImageCachePort: Send + Sync {
    /// Returns the stored bytes. Absent, unreadable, or empty keys yield `None`.
    async fn get(&self, key: &str) -> Option<Bytes>;

    /// Stores `value` under `key`, overwriting any previous entry.
    /// `None` evicts the entry instead.
    async fn put(&self, key: &str, value: Option<&[u8]>) -> CacheResult<()>;

    /// Returns true if `key` has an entry.
    async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Removes the entry under `key`, if any.
    async fn evict(&self, key: &str) -> CacheResult<()> {
        self.put(key, None).await
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;

    use parking_lot::RwLock;

    use crate::domain::errors::CacheError;

    /// In-memory cache for tests.
    #[derive(Default)]
    pub struct MemoryImageCache {
        entries: RwLock<HashMap<String, Bytes>>,
        fail_writes: bool,
    }

    impl MemoryImageCache {
        /// Creates an empty cache.
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a cache whose writes always fail.
        pub fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::default()
            }
        }

        /// Number of entries.
        pub fn len(&self) -> usize {
            self.entries.read().len()
        }
    }

    #[async_trait]
    impl ImageCachePort for MemoryImageCache {
        async fn get(&self, key: &str) -> Option<Bytes> {
            self.entries.read().get(key).cloned()
        }

        async fn put(&self, key: &str, value: Option<&[u8]>) -> CacheResult<()> {
            if self.fail_writes {
                return Err(CacheError::Io("disk full".to_string()));
            }
            match value {
                Some(bytes) => {
                    self.entries
                        .write()
                        .insert(key.to_string(), Bytes::copy_from_slice(bytes));
                }
                None => {
                    self.entries.write().remove(key);
                }
            }
            Ok(())
        }
    }
}
