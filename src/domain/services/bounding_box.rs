//! Search region derivation around a point.

use crate::domain::entities::{GeoPoint, LATITUDE_RANGE, LONGITUDE_RANGE, SearchRegion};

/// Default half-width of a search region in degrees of longitude.
pub const DEFAULT_HALF_WIDTH: f64 = 1.0;
/// Default half-height of a search region in degrees of latitude.
pub const DEFAULT_HALF_HEIGHT: f64 = 1.0;

/// Builds the search rectangle centered on `point`, clamped to the globe.
///
/// Each edge is clamped independently, so a region touching a pole or the
/// antimeridian shrinks rather than wraps.
#[must_use]
pub fn compute_region(point: GeoPoint, half_width: f64, half_height: f64) -> SearchRegion {
    let lon = point.longitude();
    let lat = point.latitude();

    SearchRegion::from_bounds(
        (lon - half_width).max(LONGITUDE_RANGE.0),
        (lat - half_height).max(LATITUDE_RANGE.0),
        (lon + half_width).min(LONGITUDE_RANGE.1),
        (lat + half_height).min(LATITUDE_RANGE.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn region(lat: f64, lon: f64, half: f64) -> SearchRegion {
        compute_region(GeoPoint::new(lat, lon).unwrap(), half, half)
    }

    #[test]
    fn test_origin_region() {
        let r = region(0.0, 0.0, 1.0);
        assert_eq!(
            (r.min_lon(), r.min_lat(), r.max_lon(), r.max_lat()),
            (-1.0, -1.0, 1.0, 1.0)
        );
        assert_eq!(r.to_bbox_param(), "-1,-1,1,1");
    }

    #[test]
    fn test_clamps_at_north_east_corner() {
        let r = region(89.5, 179.5, 1.0);
        assert!((r.max_lat() - 90.0).abs() < f64::EPSILON);
        assert!((r.max_lon() - 180.0).abs() < f64::EPSILON);
        assert!((r.min_lat() - 88.5).abs() < f64::EPSILON);
        assert!((r.min_lon() - 178.5).abs() < f64::EPSILON);
    }

    #[test_case(-89.9, -179.9 ; "south_west_corner")]
    #[test_case(90.0, 0.0 ; "north_pole")]
    #[test_case(0.0, -180.0 ; "antimeridian_west")]
    #[test_case(45.0, 180.0 ; "antimeridian_east")]
    fn test_clamped_edges_stay_in_range(lat: f64, lon: f64) {
        let r = region(lat, lon, 1.0);
        assert!(r.min_lon() >= -180.0 && r.max_lon() <= 180.0);
        assert!(r.min_lat() >= -90.0 && r.max_lat() <= 90.0);
        assert!(r.min_lon() <= r.max_lon());
        assert!(r.min_lat() <= r.max_lat());
    }

    #[test]
    fn test_bounds_hold_across_globe() {
        for lat in (-90..=90).step_by(5) {
            for lon in (-180..=180).step_by(10) {
                for half in [0.01, 0.5, 1.0, 3.0] {
                    let r = region(f64::from(lat), f64::from(lon), half);
                    assert!(-180.0 <= r.min_lon(), "{lat},{lon},{half}");
                    assert!(r.min_lon() <= r.max_lon(), "{lat},{lon},{half}");
                    assert!(r.max_lon() <= 180.0, "{lat},{lon},{half}");
                    assert!(-90.0 <= r.min_lat(), "{lat},{lon},{half}");
                    assert!(r.min_lat() <= r.max_lat(), "{lat},{lon},{half}");
                    assert!(r.max_lat() <= 90.0, "{lat},{lon},{half}");
                }
            }
        }
    }
}
