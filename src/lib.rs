//! Virtual Tourist - drop pins on a map and browse photos taken nearby.
//!
//! This crate provides the photo acquisition pipeline behind the app: search
//! region derivation, random page selection, strict response decoding, an
//! on-disk image cache, and deduplicated background image downloads.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing services and use cases.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "virtual-tourist";
