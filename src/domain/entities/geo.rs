//! Geographic value objects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Valid latitude range in degrees.
pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
/// Valid longitude range in degrees.
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

/// A point on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting non-finite or out-of-range coordinates.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let lat_ok = latitude.is_finite()
            && (LATITUDE_RANGE.0..=LATITUDE_RANGE.1).contains(&latitude);
        let lon_ok = longitude.is_finite()
            && (LONGITUDE_RANGE.0..=LONGITUDE_RANGE.1).contains(&longitude);

        (lat_ok && lon_ok).then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Rectangular search area, already clamped to the valid coordinate ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRegion {
    min_lon: f64,
    min_lat: f64,
    max_lon: f64,
    max_lat: f64,
}

impl SearchRegion {
    pub(crate) const fn from_bounds(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Western edge.
    #[must_use]
    pub const fn min_lon(&self) -> f64 {
        self.min_lon
    }

    /// Southern edge.
    #[must_use]
    pub const fn min_lat(&self) -> f64 {
        self.min_lat
    }

    /// Eastern edge.
    #[must_use]
    pub const fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// Northern edge.
    #[must_use]
    pub const fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Wire form: `minLon,minLat,maxLon,maxLat`.
    #[must_use]
    pub fn to_bbox_param(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SearchRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Visible map area, persisted between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Vertical span in degrees.
    pub latitude_delta: f64,
    /// Horizontal span in degrees.
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Widest span a map view can show, in degrees.
    pub const MAX_SPAN: f64 = 360.0;

    /// Square region of `span` degrees around `center`. The latitude span is
    /// capped at the height of the globe.
    ///
    /// Returns `None` unless `span` is finite and within `(0, MAX_SPAN]`.
    #[must_use]
    pub fn around(center: GeoPoint, span: f64) -> Option<Self> {
        Self::is_valid_span(span).then(|| Self {
            latitude: center.latitude(),
            longitude: center.longitude(),
            latitude_delta: span.min(LATITUDE_RANGE.1 - LATITUDE_RANGE.0),
            longitude_delta: span,
        })
    }

    /// True if `span` can be shown on a map view.
    #[must_use]
    pub fn is_valid_span(span: f64) -> bool {
        span.is_finite() && span > 0.0 && span <= Self::MAX_SPAN
    }

    /// Returns the region center, if it is a valid coordinate.
    #[must_use]
    pub fn center(&self) -> Option<GeoPoint> {
        GeoPoint::new(self.latitude, self.longitude)
    }

    /// True if the center is a valid coordinate and both spans are usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.center().is_some()
            && Self::is_valid_span(self.latitude_delta)
            && Self::is_valid_span(self.longitude_delta)
    }
}

impl Default for MapRegion {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            latitude_delta: 180.0,
            longitude_delta: 360.0,
        }
    }
}
