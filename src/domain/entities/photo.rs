//! Photo metadata and album records.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use super::in_flight::{InFlight, InFlightGuard};
use super::pin::{Pin, PinId};

const PHOTO_SOURCE_TEMPLATE: &str =
    "https://farm{farm}.staticflickr.com/{server}/{id}_{secret}_{size}.jpg";

/// Provider-assigned photo identifier. Also the image cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhotoId(String);

impl PhotoId {
    /// Creates a new `PhotoId`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PhotoId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Size suffixes understood by the static photo host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhotoSize {
    /// 75x75 crop.
    SmallSquare,
    /// 150x150 crop.
    LargeSquare,
    /// 100 on the longest side.
    Thumbnail,
    /// 240 on the longest side.
    Small240,
    /// 320 on the longest side.
    Small320,
    /// 500 on the longest side.
    Medium500,
    /// 640 on the longest side.
    #[default]
    Medium640,
    /// 800 on the longest side.
    Medium800,
    /// 1024 on the longest side.
    Large1024,
    /// 1600 on the longest side.
    Large1600,
    /// 2048 on the longest side.
    Large2048,
    /// Original upload.
    Original,
}

impl PhotoSize {
    /// URL suffix for this size.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::SmallSquare => "s",
            Self::LargeSquare => "q",
            Self::Thumbnail => "t",
            Self::Small240 => "m",
            Self::Small320 => "n",
            Self::Medium500 => "-",
            Self::Medium640 => "z",
            Self::Medium800 => "c",
            Self::Large1024 => "b",
            Self::Large1600 => "h",
            Self::Large2048 => "k",
            Self::Original => "o",
        }
    }
}

/// Raw fields from which a static photo URL can be built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSource {
    /// Photo id.
    pub id: String,
    /// Access secret.
    pub secret: String,
    /// Server id.
    pub server: String,
    /// Farm number.
    pub farm: u32,
}

impl PhotoSource {
    /// Expands the static URL template for `size`.
    #[must_use]
    pub fn url(&self, size: PhotoSize) -> String {
        let farm = self.farm.to_string();
        [
            ("{farm}", farm.as_str()),
            ("{server}", self.server.as_str()),
            ("{id}", self.id.as_str()),
            ("{secret}", self.secret.as_str()),
            ("{size}", size.suffix()),
        ]
        .into_iter()
        .fold(PHOTO_SOURCE_TEMPLATE.to_string(), |url, (key, value)| {
            url.replace(key, value)
        })
    }
}

/// One search hit: a photo reference before it joins an album.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoMetadata {
    /// Provider id.
    pub id: PhotoId,
    /// Media URL the image bytes are fetched from.
    pub remote_url: String,
    /// Title, if the provider sent one.
    pub title: Option<String>,
}

impl PhotoMetadata {
    /// Creates metadata from an id and URL.
    #[must_use]
    pub fn new(id: impl Into<PhotoId>, remote_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            remote_url: remote_url.into(),
            title: None,
        }
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// A photo belonging to a pin's album.
///
/// The record only holds a weak reference to its pin; cached image bytes
/// live in the image cache under [`PhotoRecord::cache_key`].
#[derive(Debug)]
pub struct PhotoRecord {
    id: PhotoId,
    remote_url: String,
    title: Option<String>,
    pin_id: PinId,
    pin: Weak<Pin>,
    fetch: InFlight,
    removed: AtomicBool,
}

impl PhotoRecord {
    /// Creates a record attached to `pin`.
    #[must_use]
    pub fn new(metadata: PhotoMetadata, pin: &Arc<Pin>) -> Arc<Self> {
        Arc::new(Self {
            id: metadata.id,
            remote_url: metadata.remote_url,
            title: metadata.title,
            pin_id: pin.id(),
            pin: Arc::downgrade(pin),
            fetch: InFlight::new(),
            removed: AtomicBool::new(false),
        })
    }

    /// Provider id.
    #[must_use]
    pub const fn id(&self) -> &PhotoId {
        &self.id
    }

    /// Media URL.
    #[must_use]
    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Title, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Id of the owning pin.
    #[must_use]
    pub const fn pin_id(&self) -> PinId {
        self.pin_id
    }

    /// Owning pin, unless it has been dropped.
    #[must_use]
    pub fn pin(&self) -> Option<Arc<Pin>> {
        self.pin.upgrade()
    }

    /// Key under which this record's bytes are cached.
    #[must_use]
    pub fn cache_key(&self) -> &str {
        self.id.as_str()
    }

    /// True while an image download for this record is running.
    #[must_use]
    pub fn fetch_in_progress(&self) -> bool {
        self.fetch.is_set()
    }

    pub(crate) fn try_begin_fetch(&self) -> Option<InFlightGuard<'_>> {
        self.fetch.try_acquire()
    }

    /// True once the record has been taken out of its pin's album.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// True if the record is removed and its pin holds no other record for
    /// the same cache key. Bytes cached for an orphaned record are garbage.
    #[must_use]
    pub fn is_orphaned(&self) -> bool {
        self.is_removed()
            && self
                .pin()
                .and_then(|pin| pin.find_photo(&self.id))
                .is_none()
    }

    pub(crate) fn mark_removed(&self) {
        self.removed.store(true, Ordering::Release);
    }
}
