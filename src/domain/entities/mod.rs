//! Domain entity definitions.

mod geo;
mod in_flight;
mod photo;
mod pin;

pub use geo::{GeoPoint, LATITUDE_RANGE, LONGITUDE_RANGE, MapRegion, SearchRegion};
pub use in_flight::{InFlight, InFlightGuard};
pub use photo::{PhotoId, PhotoMetadata, PhotoRecord, PhotoSize, PhotoSource};
pub use pin::{Pin, PinId};
