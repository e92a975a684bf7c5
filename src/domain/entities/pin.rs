//! Map pin entity.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geo::GeoPoint;
use super::in_flight::{InFlight, InFlightGuard};
use super::photo::{PhotoId, PhotoMetadata, PhotoRecord};

/// Unique pin identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(Uuid);

impl PinId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PinId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// User-placed marker owning a photo album.
///
/// The album and the `fetch_in_progress` flag are only mutated by the
/// search pipeline; everything else reads them.
#[derive(Debug)]
pub struct Pin {
    id: PinId,
    coordinate: RwLock<GeoPoint>,
    created_at: DateTime<Utc>,
    search: InFlight,
    photos: RwLock<Vec<Arc<PhotoRecord>>>,
}

impl Pin {
    /// Creates a new pin at `point` with an empty album.
    #[must_use]
    pub fn new(point: GeoPoint) -> Arc<Self> {
        Self::restore(PinId::generate(), point, Utc::now())
    }

    /// Rebuilds a persisted pin. Its album starts empty and its search flag idle.
    #[must_use]
    pub fn restore(id: PinId, point: GeoPoint, created_at: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            id,
            coordinate: RwLock::new(point),
            created_at,
            search: InFlight::new(),
            photos: RwLock::new(Vec::new()),
        })
    }

    /// Pin id.
    #[must_use]
    pub const fn id(&self) -> PinId {
        self.id
    }

    /// Current location.
    #[must_use]
    pub fn coordinate(&self) -> GeoPoint {
        *self.coordinate.read()
    }

    /// Latitude in degrees.
    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.coordinate().latitude()
    }

    /// Longitude in degrees.
    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.coordinate().longitude()
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Moves the pin. The album is left as-is until a new collection is loaded.
    pub fn relocate(&self, point: GeoPoint) {
        *self.coordinate.write() = point;
    }

    /// True while a photo search for this pin is running.
    #[must_use]
    pub fn fetch_in_progress(&self) -> bool {
        self.search.is_set()
    }

    pub(crate) fn try_begin_search(&self) -> Option<InFlightGuard<'_>> {
        self.search.try_acquire()
    }

    /// Snapshot of the album in display order.
    #[must_use]
    pub fn photos(&self) -> Vec<Arc<PhotoRecord>> {
        self.photos.read().clone()
    }

    /// Number of photos in the album.
    #[must_use]
    pub fn photo_count(&self) -> usize {
        self.photos.read().len()
    }

    /// Looks up a photo by id.
    #[must_use]
    pub fn find_photo(&self, id: &PhotoId) -> Option<Arc<PhotoRecord>> {
        self.photos.read().iter().find(|p| p.id() == id).cloned()
    }

    /// Replaces the album with records built from `metadata`, keeping order.
    /// Returns the records that were removed, each marked as such.
    pub(crate) fn replace_photos(
        self: &Arc<Self>,
        metadata: Vec<PhotoMetadata>,
    ) -> Vec<Arc<PhotoRecord>> {
        let records: Vec<_> = metadata
            .into_iter()
            .map(|m| PhotoRecord::new(m, self))
            .collect();

        let old = std::mem::replace(&mut *self.photos.write(), records);
        old.iter().for_each(|record| record.mark_removed());
        old
    }

    /// Removes one photo from the album.
    pub(crate) fn remove_photo(&self, id: &PhotoId) -> Option<Arc<PhotoRecord>> {
        let mut photos = self.photos.write();
        let index = photos.iter().position(|p| p.id() == id)?;
        let record = photos.remove(index);
        record.mark_removed();
        Some(record)
    }

    /// Empties the album, returning the removed records.
    pub(crate) fn take_photos(&self) -> Vec<Arc<PhotoRecord>> {
        let old = std::mem::take(&mut *self.photos.write());
        old.iter().for_each(|record| record.mark_removed());
        old
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_pin_id_round_trip() {
        let id = PinId::generate();
        let parsed: PinId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert!("not-a-uuid".parse::<PinId>().is_err());
    }

    #[test]
    fn test_replace_photos_preserves_order() {
        let pin = Pin::new(point(1.0, 2.0));
        let old = pin.replace_photos(vec![
            PhotoMetadata::new("3", "u3"),
            PhotoMetadata::new("1", "u1"),
            PhotoMetadata::new("2", "u2"),
        ]);

        assert!(old.is_empty());
        let ids: Vec<_> = pin.photos().iter().map(|p| p.id().to_string()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert!(pin.photos().iter().all(|p| p.pin_id() == pin.id()));
    }

    #[test]
    fn test_remove_photo() {
        let pin = Pin::new(point(1.0, 2.0));
        pin.replace_photos(vec![PhotoMetadata::new("a", "ua"), PhotoMetadata::new("b", "ub")]);

        let removed = pin.remove_photo(&PhotoId::new("a")).unwrap();
        assert_eq!(removed.id(), &PhotoId::new("a"));
        assert!(removed.is_removed());
        assert_eq!(pin.photo_count(), 1);
        assert!(!pin.photos()[0].is_removed());
        assert!(pin.remove_photo(&PhotoId::new("missing")).is_none());
    }

    #[test]
    fn test_take_photos_marks_records_removed() {
        let pin = Pin::new(point(1.0, 2.0));
        pin.replace_photos(vec![PhotoMetadata::new("a", "ua"), PhotoMetadata::new("b", "ub")]);

        let taken = pin.take_photos();
        assert_eq!(taken.len(), 2);
        assert!(taken.iter().all(|p| p.is_orphaned()));
        assert_eq!(pin.photo_count(), 0);
    }

    #[test]
    fn test_relocate() {
        let pin = Pin::new(point(1.0, 2.0));
        pin.relocate(point(-33.9, 151.2));
        assert!((pin.latitude() + 33.9).abs() < f64::EPSILON);
        assert!((pin.longitude() - 151.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_search_flag_exclusive() {
        let pin = Pin::new(point(0.0, 0.0));
        let guard = pin.try_begin_search();
        assert!(guard.is_some());
        assert!(pin.fetch_in_progress());
        assert!(pin.try_begin_search().is_none());
        drop(guard);
        assert!(!pin.fetch_in_progress());
    }
}
