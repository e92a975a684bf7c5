//! Pure domain services.

pub mod bounding_box;

pub use bounding_box::{DEFAULT_HALF_HEIGHT, DEFAULT_HALF_WIDTH, compute_region};
