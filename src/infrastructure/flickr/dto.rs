//! Flickr REST response structures and envelope decoding.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domain::entities::{PhotoMetadata, PhotoSize, PhotoSource};
use crate::domain::errors::SearchError;
use crate::domain::serde_utils::{option_string_or_u32, string_or_number};

const STATUS_OK: &str = "ok";

/// The `photos` object of a search response.
#[derive(Debug, Deserialize)]
pub struct PhotosPage {
    /// Current page.
    #[serde(default, with = "option_string_or_u32")]
    pub page: Option<u32>,
    /// Number of pages at the requested page size.
    #[serde(default, with = "option_string_or_u32")]
    pub pages: Option<u32>,
    /// Total matching photos.
    #[serde(default, with = "option_string_or_u32")]
    pub total: Option<u32>,
    /// Entries on this page.
    pub photo: Vec<PhotoEntry>,
}

/// A single photo entry.
#[derive(Debug, Deserialize)]
pub struct PhotoEntry {
    /// Flickr photo id.
    #[serde(with = "string_or_number")]
    pub id: String,
    /// Medium-size URL, present when requested via `extras`.
    #[serde(default)]
    pub url_m: Option<String>,
    /// Photo title.
    #[serde(default)]
    pub title: Option<String>,
    /// Access secret.
    #[serde(default)]
    pub secret: Option<String>,
    /// Server id.
    #[serde(default, with = "option_string_or_number")]
    pub server: Option<String>,
    /// Farm number.
    #[serde(default)]
    pub farm: Option<u32>,
}

mod option_string_or_number {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(transparent)]
    struct Id(#[serde(with = "crate::domain::serde_utils::string_or_number")] String);

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Id>::deserialize(deserializer)?.map(|Id(s)| s))
    }
}

impl PhotoEntry {
    /// Resolves the entry to metadata, preferring `url_m` over the URL template.
    /// Entries with neither are unusable.
    #[must_use]
    pub fn into_metadata(self) -> Option<PhotoMetadata> {
        let url = match self.url_m.filter(|u| !u.is_empty()) {
            Some(url) => url,
            None => {
                let source = PhotoSource {
                    id: self.id.clone(),
                    secret: self.secret?,
                    server: self.server?,
                    farm: self.farm?,
                };
                source.url(PhotoSize::default())
            }
        };

        let metadata = PhotoMetadata::new(self.id, url);
        Some(match self.title.filter(|t| !t.trim().is_empty()) {
            Some(title) => metadata.with_title(title),
            None => metadata,
        })
    }
}

/// Decodes a search response body into its `photos` page.
///
/// # Errors
/// - `MalformedResponse` when the body is not JSON.
/// - `ProviderError` when `stat` is not `ok`.
/// - `SchemaMismatch` when `photos` or `photos.photo` is missing or mistyped.
pub fn decode_search_page(body: &[u8]) -> Result<PhotosPage, SearchError> {
    let parsed: Value = serde_json::from_slice(body)
        .map_err(|e| SearchError::MalformedResponse(e.to_string()))?;

    let stat = parsed.get("stat").and_then(Value::as_str);
    if stat != Some(STATUS_OK) {
        let detail = match (
            parsed.get("code").and_then(Value::as_i64),
            parsed.get("message").and_then(Value::as_str),
        ) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            _ => String::from_utf8_lossy(body).into_owned(),
        };
        return Err(SearchError::ProviderError(detail));
    }

    let photos = parsed
        .get("photos")
        .filter(|p| p.is_object())
        .ok_or_else(|| SearchError::schema("missing `photos` object"))?;

    if !photos.get("photo").is_some_and(Value::is_array) {
        return Err(SearchError::schema("missing `photos.photo` list"));
    }

    PhotosPage::deserialize(photos).map_err(|e| SearchError::schema(e.to_string()))
}

/// Converts a decoded page into album metadata, keeping response order.
///
/// # Errors
/// Returns `NoPhotosFound` when no usable entries remain.
pub fn page_into_metadata(page: PhotosPage) -> Result<Vec<PhotoMetadata>, SearchError> {
    let received = page.photo.len();
    let photos: Vec<_> = page
        .photo
        .into_iter()
        .filter_map(PhotoEntry::into_metadata)
        .collect();

    if photos.len() < received {
        debug!(
            received = received,
            usable = photos.len(),
            "Skipped photo entries without a usable URL"
        );
    }

    if photos.is_empty() {
        return Err(SearchError::NoPhotosFound);
    }

    Ok(photos)
}
