//! Pin persistence adapters.

mod pin_store;

pub use pin_store::JsonPinStore;
