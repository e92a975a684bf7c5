//! JSON file pin store.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::entities::{GeoPoint, PhotoMetadata, Pin, PinId};
use crate::domain::errors::StoreError;
use crate::domain::ports::PinStorePort;

const STORE_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    pins: Vec<StoredPin>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPin {
    id: PinId,
    latitude: f64,
    longitude: f64,
    created_at: DateTime<Utc>,
    #[serde(default)]
    fetch_in_progress: bool,
    #[serde(default)]
    photos: Vec<StoredPhoto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPhoto {
    id: String,
    remote_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

impl StoredPin {
    fn from_pin(pin: &Pin) -> Self {
        Self {
            id: pin.id(),
            latitude: pin.latitude(),
            longitude: pin.longitude(),
            created_at: pin.created_at(),
            fetch_in_progress: pin.fetch_in_progress(),
            photos: pin
                .photos()
                .iter()
                .map(|record| StoredPhoto {
                    id: record.id().to_string(),
                    remote_url: record.remote_url().to_string(),
                    title: record.title().map(str::to_string),
                })
                .collect(),
        }
    }

    fn into_pin(self) -> Result<Arc<Pin>, StoreError> {
        let point = GeoPoint::new(self.latitude, self.longitude).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "pin {} has invalid coordinate ({}, {})",
                self.id, self.latitude, self.longitude
            ))
        })?;

        if self.fetch_in_progress {
            debug!(pin_id = %self.id, "Clearing stale fetch flag");
        }

        let pin = Pin::restore(self.id, point, self.created_at);
        let metadata = self
            .photos
            .into_iter()
            .map(|photo| {
                let metadata = PhotoMetadata::new(photo.id, photo.remote_url);
                match photo.title {
                    Some(title) => metadata.with_title(title),
                    None => metadata,
                }
            })
            .collect();
        pin.replace_photos(metadata);
        Ok(pin)
    }
}

/// Persists pins and their albums in a single JSON document.
///
/// Writes go through a temp file in the same directory and are renamed into
/// place, so a crash never leaves a half-written store.
pub struct JsonPinStore {
    path: PathBuf,
    pins: Mutex<Option<BTreeMap<PinId, StoredPin>>>,
}

impl JsonPinStore {
    /// Creates a store backed by `path`. Nothing is read until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pins: Mutex::new(None),
        }
    }

    /// Store file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(path: &Path) -> Result<BTreeMap<PinId, StoredPin>, StoreError> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = ?path, "Pin store not found, starting empty");
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(e.into()),
        };

        let file: StoreFile = serde_json::from_slice(&content)?;
        if file.version > STORE_VERSION {
            warn!(
                version = file.version,
                supported = STORE_VERSION,
                "Pin store written by a newer version"
            );
        }

        Ok(file.pins.into_iter().map(|p| (p.id, p)).collect())
    }

    async fn write_file(
        path: PathBuf,
        pins: &BTreeMap<PinId, StoredPin>,
    ) -> Result<(), StoreError> {
        let file = StoreFile {
            version: STORE_VERSION,
            pins: pins.values().cloned().collect(),
        };
        let content = serde_json::to_vec_pretty(&file)?;

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let parent = path
                .parent()
                .ok_or_else(|| std::io::Error::other("Invalid path"))?;
            std::fs::create_dir_all(parent)?;
            let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
            temp_file.write_all(&content)?;
            temp_file.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }

    /// Applies `f` to a copy of the pins and keeps the copy only once it is on disk.
    async fn with_pins<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<PinId, StoredPin>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut guard = self.pins.lock().await;
        let mut pins = match guard.as_ref() {
            Some(pins) => pins.clone(),
            None => Self::read_file(&self.path).await?,
        };

        let result = f(&mut pins)?;
        Self::write_file(self.path.clone(), &pins).await?;
        *guard = Some(pins);
        Ok(result)
    }
}

impl std::fmt::Debug for JsonPinStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonPinStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl PinStorePort for JsonPinStore {
    async fn load_all(&self) -> Result<Vec<Arc<Pin>>, StoreError> {
        let mut guard = self.pins.lock().await;
        let stored = Self::read_file(&self.path).await?;

        let mut pins: Vec<_> = stored.values().cloned().collect();
        pins.sort_by_key(|p| p.created_at);
        let pins = pins
            .into_iter()
            .map(StoredPin::into_pin)
            .collect::<Result<Vec<_>, _>>()?;

        *guard = Some(stored);
        debug!(count = pins.len(), "Loaded pins");
        Ok(pins)
    }

    async fn save(&self, pin: &Pin) -> Result<(), StoreError> {
        let record = StoredPin::from_pin(pin);
        let id = record.id;
        let photo_count = record.photos.len();

        self.with_pins(|pins| {
            pins.insert(id, record);
            Ok(())
        })
        .await?;

        debug!(pin_id = %id, photos = photo_count, "Saved pin");
        Ok(())
    }

    async fn delete(&self, id: PinId) -> Result<(), StoreError> {
        self.with_pins(|pins| pins.remove(&id).map(|_| ()).ok_or(StoreError::NotFound(id)))
            .await?;

        debug!(pin_id = %id, "Deleted pin");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::PhotoId;
    use tempfile::tempdir;

    fn pin_at(lat: f64, lon: f64) -> Arc<Pin> {
        Pin::new(GeoPoint::new(lat, lon).unwrap())
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonPinStore::new(dir.path().join("pins.json"));

        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_reload_album() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("pins.json");
        let store = JsonPinStore::new(&path);

        let pin = pin_at(40.7, -74.0);
        pin.replace_photos(vec![
            PhotoMetadata::new("3", "https://img/3.jpg").with_title("Skyline"),
            PhotoMetadata::new("1", "https://img/1.jpg"),
        ]);
        store.save(&pin).await.unwrap();
        assert!(path.exists());

        let reopened = JsonPinStore::new(&path);
        let pins = reopened.load_all().await.unwrap();
        assert_eq!(pins.len(), 1);

        let loaded = &pins[0];
        assert_eq!(loaded.id(), pin.id());
        assert_eq!(loaded.coordinate(), pin.coordinate());
        let ids: Vec<_> = loaded.photos().iter().map(|p| p.id().clone()).collect();
        assert_eq!(ids, vec![PhotoId::from("3"), PhotoId::from("1")]);
        assert_eq!(loaded.photos()[0].title(), Some("Skyline"));
        assert!(loaded.photos().iter().all(|p| p.pin_id() == pin.id()));
    }

    #[tokio::test]
    async fn test_fetch_flag_is_reset_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pins.json");
        let store = JsonPinStore::new(&path);

        let pin = pin_at(1.0, 1.0);
        let guard = pin.try_begin_search().unwrap();
        store.save(&pin).await.unwrap();
        drop(guard);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"fetch_in_progress\": true"));

        let pins = JsonPinStore::new(&path).load_all().await.unwrap();
        assert!(!pins[0].fetch_in_progress());
    }

    #[tokio::test]
    async fn test_delete_pin() {
        let dir = tempdir().unwrap();
        let store = JsonPinStore::new(dir.path().join("pins.json"));

        let keep = pin_at(10.0, 10.0);
        let gone = pin_at(20.0, 20.0);
        store.save(&keep).await.unwrap();
        store.save(&gone).await.unwrap();

        store.delete(gone.id()).await.unwrap();

        let pins = store.load_all().await.unwrap();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].id(), keep.id());

        let err = store.delete(gone.id()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == gone.id()));
    }

    #[tokio::test]
    async fn test_failed_write_is_not_persisted_later() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let path = data_dir.join("pins.json");
        let store = JsonPinStore::new(&path);

        let first = pin_at(10.0, 10.0);
        store.save(&first).await.unwrap();

        std::fs::remove_dir_all(&data_dir).unwrap();
        std::fs::write(&data_dir, "not a directory").unwrap();
        assert!(store.delete(first.id()).await.is_err());

        std::fs::remove_file(&data_dir).unwrap();
        let second = pin_at(20.0, 20.0);
        store.save(&second).await.unwrap();

        let ids: Vec<_> = JsonPinStore::new(&path)
            .load_all()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id())
            .collect();
        assert_eq!(ids, vec![first.id(), second.id()]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pins.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = JsonPinStore::new(&path).load_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_invalid_coordinate_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pins.json");
        let body = format!(
            r#"{{"version":1,"pins":[{{"id":"{}","latitude":123.0,"longitude":0.0,"created_at":"2024-01-01T00:00:00Z"}}]}}"#,
            PinId::generate()
        );
        std::fs::write(&path, body).unwrap();

        let err = JsonPinStore::new(&path).load_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
