//! Per-photo image download with in-flight deduplication.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::domain::entities::{PhotoId, PhotoRecord, Pin, PinId};
use crate::domain::errors::FetchError;
use crate::domain::ports::{HttpTransport, ImageCachePort};

/// Default number of downloads allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 4;

/// How a fetch call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The bytes were already cached; nothing was downloaded.
    AlreadyCached,
    /// The bytes were downloaded and cached.
    Fetched {
        /// Body size in bytes.
        bytes: usize,
    },
    /// Another fetch for the same record is running; this call did nothing.
    InFlight,
    /// The record left its album before the bytes could be kept.
    Discarded,
}

/// Sent when a fetch that actually ran finishes.
#[derive(Debug, Clone)]
pub struct ImageFetchedEvent {
    /// Photo the fetch was for.
    pub photo_id: PhotoId,
    /// Owning pin.
    pub pin_id: PinId,
    /// Fetch result.
    pub result: Result<FetchOutcome, FetchError>,
}

/// Downloads photo bytes into the image cache, at most once at a time per record.
pub struct PhotoImageFetcher {
    transport: Arc<dyn HttpTransport>,
    cache: Arc<dyn ImageCachePort>,
    semaphore: Arc<Semaphore>,
    event_tx: Option<mpsc::UnboundedSender<ImageFetchedEvent>>,
}

impl PhotoImageFetcher {
    /// Creates a fetcher with the default download limit.
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>, cache: Arc<dyn ImageCachePort>) -> Self {
        Self {
            transport,
            cache,
            semaphore: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_DOWNLOADS)),
            event_tx: None,
        }
    }

    /// Limits how many downloads run at once.
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    /// Reports finished fetches on `event_tx`.
    #[must_use]
    pub fn with_events(mut self, event_tx: mpsc::UnboundedSender<ImageFetchedEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Ensures `record`'s bytes are cached, downloading them if needed.
    ///
    /// Returns [`FetchOutcome::InFlight`] without touching the network when a
    /// fetch for the same record is already running. The record becomes
    /// fetchable again before the completion event is sent, or when this
    /// call is dropped.
    ///
    /// Bytes are never left cached for a record that was deleted while its
    /// download was running; such calls return [`FetchOutcome::Discarded`].
    ///
    /// # Errors
    /// Returns `FetchError` if the download fails, yields no data or a
    /// non-image body, or the bytes cannot be cached.
    pub async fn fetch_if_absent(&self, record: &PhotoRecord) -> Result<FetchOutcome, FetchError> {
        let Some(guard) = record.try_begin_fetch() else {
            trace!(photo_id = %record.id(), "Fetch already in flight");
            return Ok(FetchOutcome::InFlight);
        };

        let result = self.fetch(record).await;
        drop(guard);

        match &result {
            Ok(outcome) => trace!(photo_id = %record.id(), outcome = ?outcome, "Fetch finished"),
            Err(e) => warn!(photo_id = %record.id(), error = %e, "Image fetch failed"),
        }

        if let Some(tx) = &self.event_tx {
            let event = ImageFetchedEvent {
                photo_id: record.id().clone(),
                pin_id: record.pin_id(),
                result: result.clone(),
            };
            if tx.send(event).is_err() {
                trace!("Image event receiver dropped");
            }
        }

        result
    }

    async fn fetch(&self, record: &PhotoRecord) -> Result<FetchOutcome, FetchError> {
        if record.is_removed() {
            return Ok(FetchOutcome::Discarded);
        }
        if self.cache.contains(record.cache_key()).await {
            return Ok(FetchOutcome::AlreadyCached);
        }

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| FetchError::Transport("download queue closed".to_string()))?;

        debug!(photo_id = %record.id(), url = %record.remote_url(), "Downloading image");
        let response = self.transport.get(record.remote_url(), &[]).await?;

        if !response.is_success() {
            return Err(FetchError::Transport(format!("HTTP {}", response.status)));
        }
        if response.body.is_empty() {
            return Err(FetchError::NoData);
        }
        if image::guess_format(&response.body).is_err() {
            return Err(FetchError::NotAnImage);
        }

        self.cache
            .put(record.cache_key(), Some(&response.body[..]))
            .await?;

        // Deletion marks the record before evicting, so either its eviction
        // ran after this put or the mark is visible here.
        if record.is_orphaned() {
            debug!(photo_id = %record.id(), "Record removed during download, discarding bytes");
            self.cache.evict(record.cache_key()).await?;
            return Ok(FetchOutcome::Discarded);
        }

        Ok(FetchOutcome::Fetched {
            bytes: response.body.len(),
        })
    }

    /// Fetches every photo of `pin` in the background.
    ///
    /// The task resolves to the number of photos newly downloaded.
    pub fn prefetch(self: &Arc<Self>, pin: &Pin) -> JoinHandle<usize> {
        let fetcher = Arc::clone(self);
        let photos = pin.photos();
        let pin_id = pin.id();

        tokio::spawn(async move {
            let results = join_all(photos.iter().map(|p| fetcher.fetch_if_absent(p))).await;
            let fetched = results
                .iter()
                .filter(|r| matches!(r, Ok(FetchOutcome::Fetched { .. })))
                .count();
            let failed = results.iter().filter(|r| r.is_err()).count();

            debug!(pin_id = %pin_id, fetched = fetched, failed = failed, "Prefetch finished");
            fetched
        })
    }

    /// Decodes `record`'s cached bytes, if present.
    pub async fn cached_image(&self, record: &PhotoRecord) -> Option<image::DynamicImage> {
        let bytes = self.cache.get(record.cache_key()).await?;

        match tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await {
            Ok(Ok(img)) => Some(img),
            Ok(Err(e)) => {
                warn!(photo_id = %record.id(), error = %e, "Cached image failed to decode");
                None
            }
            Err(e) => {
                warn!(error = %e, "Image decode task failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for PhotoImageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoImageFetcher")
            .field("available_permits", &self.semaphore.available_permits())
            .finish_non_exhaustive()
    }
}
