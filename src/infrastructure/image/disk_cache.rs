//! Disk-based image cache for persistence across sessions.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, trace, warn};

use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::ports::ImageCachePort;

/// Maximum disk cache size in bytes (200 MB default).
pub const DEFAULT_MAX_CACHE_SIZE: u64 = 200 * 1024 * 1024;

const ENTRY_EXTENSION: &str = "img";
const MAX_PLAIN_KEY_LEN: usize = 64;
const HASHED_PREFIX: char = '~';

/// Disk-based image cache, one file per key in a flat directory.
pub struct DiskImageCache {
    cache_dir: PathBuf,
    max_size: u64,
    current_size: AtomicU64,
    item_count: AtomicUsize,
}

impl DiskImageCache {
    /// Creates a new disk cache in the specified directory.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be created.
    pub async fn new(cache_dir: PathBuf, max_size: u64) -> CacheResult<Self> {
        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {e}")))?;
        let mut total_size = 0u64;
        let mut count = 0usize;

        let mut entries = fs::read_dir(&cache_dir)
            .await
            .map_err(|e| CacheError::Io(format!("Failed to read cache dir: {e}")))?;

        while let Ok(Some(entry)) = entries.next_entry().await {
            if is_entry(&entry.path())
                && let Ok(meta) = entry.metadata().await
            {
                total_size += meta.len();
                count += 1;
            }
        }

        let cache = Self {
            cache_dir,
            max_size,
            current_size: AtomicU64::new(total_size),
            item_count: AtomicUsize::new(count),
        };

        cache.cleanup(None).await;

        Ok(cache)
    }

    /// Directory holding the entries.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path for a key, or `None` for an empty key.
    fn cache_path(&self, key: &str) -> Option<PathBuf> {
        let stem = file_stem(key)?;
        Some(self.cache_dir.join(format!("{stem}.{ENTRY_EXTENSION}")))
    }

    /// Reads raw bytes for `key`.
    pub async fn get_bytes(&self, key: &str) -> Option<Bytes> {
        let path = self.cache_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => {
                trace!(key = %key, path = %path.display(), "Disk cache hit");
                Some(Bytes::from(bytes))
            }
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(key = %key, error = %e, "Unreadable cache entry");
                }
                trace!(key = %key, "Disk cache miss");
                None
            }
        }
    }

    /// Stores raw bytes, replacing any previous entry atomically.
    ///
    /// The new entry survives the size cleanup this triggers, even when it
    /// alone exceeds the limit.
    ///
    /// # Errors
    /// Returns error if the key is empty or the file cannot be written.
    pub async fn put_bytes(&self, key: &str, bytes: &[u8]) -> CacheResult<()> {
        let path = self
            .cache_path(key)
            .ok_or_else(|| CacheError::InvalidKey(key.to_string()))?;
        let tmp_path = path.with_extension("tmp");

        let old_size = fs::metadata(&path).await.map(|m| m.len()).ok();

        fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| CacheError::Io(format!("Failed to write cache file: {e}")))?;

        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(CacheError::Io(format!("Failed to persist cache file: {e}")));
        }

        let new_size = bytes.len() as u64;
        if let Some(old) = old_size {
            if new_size > old {
                self.current_size
                    .fetch_add(new_size - old, Ordering::Relaxed);
            } else {
                self.current_size
                    .fetch_sub(old - new_size, Ordering::Relaxed);
            }
        } else {
            self.current_size.fetch_add(new_size, Ordering::Relaxed);
            self.item_count.fetch_add(1, Ordering::Relaxed);
        }

        debug!(key = %key, path = %path.display(), size = bytes.len(), "Stored image in disk cache");

        self.cleanup(Some(path.as_path())).await;

        Ok(())
    }

    /// Removes the entry for `key`. Missing entries are not an error.
    ///
    /// # Errors
    /// Returns error if the key is empty or the file cannot be removed.
    pub async fn remove(&self, key: &str) -> CacheResult<()> {
        let path = self
            .cache_path(key)
            .ok_or_else(|| CacheError::InvalidKey(key.to_string()))?;
        let size = fs::metadata(&path).await.map(|m| m.len()).ok();

        match fs::remove_file(&path).await {
            Ok(()) => {
                if let Some(s) = size {
                    self.current_size.fetch_sub(s, Ordering::Relaxed);
                    self.item_count.fetch_sub(1, Ordering::Relaxed);
                }
                debug!(key = %key, "Evicted from disk cache");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to evict from disk cache");
                Err(CacheError::Io(format!("Failed to remove cache file: {e}")))
            }
        }
    }

    /// Clears the entire disk cache.
    ///
    /// # Errors
    /// Returns error if cache directory cannot be read.
    pub async fn clear(&self) -> CacheResult<()> {
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| CacheError::Io(format!("Failed to read cache dir: {e}")))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CacheError::Io(format!("Failed to read entry: {e}")))?
        {
            let path = entry.path();
            if is_entry(&path) && fs::remove_file(&path).await.is_err() {
                warn!(path = %path.display(), "Failed to remove cache file");
            }
        }
        self.current_size.store(0, Ordering::Relaxed);
        self.item_count.store(0, Ordering::Relaxed);
        debug!("Cleared disk cache");
        Ok(())
    }

    /// Returns the current cache size in bytes.
    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size.load(Ordering::Relaxed)
    }

    /// Returns the number of cached files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.item_count.load(Ordering::Relaxed)
    }

    /// Returns true if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes least recently accessed entries once over the size limit.
    pub async fn cleanup_if_needed(&self) {
        self.cleanup(None).await;
    }

    async fn cleanup(&self, keep: Option<&Path>) {
        let current_size = self.current_size();
        if current_size <= self.max_size {
            return;
        }

        debug!(
            current_size = current_size,
            max_size = self.max_size,
            "Disk cache over limit, cleaning up"
        );

        let Ok(mut entries) = fs::read_dir(&self.cache_dir).await else {
            return;
        };

        let mut files: Vec<(PathBuf, std::time::SystemTime, u64)> = Vec::new();

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if !is_entry(&path) || keep == Some(path.as_path()) {
                continue;
            }

            if let Ok(meta) = entry.metadata().await {
                let accessed = meta
                    .accessed()
                    .or_else(|_| meta.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
                files.push((path, accessed, meta.len()));
            }
        }

        files.sort_by_key(|(_, time, _)| *time);

        let mut freed_size = 0u64;
        let mut freed_count = 0usize;
        let target = current_size - self.max_size + (self.max_size / 10);

        for (path, _, size) in files {
            if freed_size >= target {
                break;
            }

            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = %path.display(), error = %e, "Failed to remove old cache file");
            } else {
                debug!(path = %path.display(), "Removed old cache file");
                freed_size += size;
                freed_count += 1;
            }
        }
        self.current_size.fetch_sub(freed_size, Ordering::Relaxed);
        self.item_count.fetch_sub(freed_count, Ordering::Relaxed);

        debug!(
            freed_size = freed_size,
            freed_count = freed_count,
            "Disk cache cleanup complete"
        );
    }
}

impl std::fmt::Debug for DiskImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskImageCache")
            .field("cache_dir", &self.cache_dir)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageCachePort for DiskImageCache {
    async fn get(&self, key: &str) -> Option<Bytes> {
        self.get_bytes(key).await
    }

    async fn put(&self, key: &str, value: Option<&[u8]>) -> CacheResult<()> {
        match value {
            Some(bytes) => self.put_bytes(key, bytes).await,
            None => self.remove(key).await,
        }
    }

    async fn contains(&self, key: &str) -> bool {
        match self.cache_path(key) {
            Some(path) => fs::try_exists(&path).await.unwrap_or(false),
            None => false,
        }
    }
}

/// Maps a key to a filesystem-safe file stem.
///
/// Short keys of `[A-Za-z0-9_-]` are used verbatim; anything else is hashed.
/// Hashed stems carry a prefix outside that alphabet so the two never collide.
fn file_stem(key: &str) -> Option<String> {
    if key.is_empty() {
        return None;
    }

    let plain = key.len() <= MAX_PLAIN_KEY_LEN
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if plain {
        Some(key.to_string())
    } else {
        let digest = Sha256::digest(key.as_bytes());
        Some(format!("{HASHED_PREFIX}{}", hex::encode(&digest[..16])))
    }
}

fn is_entry(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
}
