//! Application layer with services and use cases.

/// Orchestration services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use services::{
    FetchOutcome, ImageFetchedEvent, PageSelector, PhotoImageFetcher, TaskSlot,
};
pub use use_cases::{
    DeletePhotoUseCase, DeletePinUseCase, DropPinUseCase, DroppedPin, NewCollectionUseCase,
    SearchOutcome,
};
