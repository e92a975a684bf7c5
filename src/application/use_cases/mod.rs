//! Use case implementations.

mod delete_photo_use_case;
mod delete_pin_use_case;
mod drop_pin_use_case;
mod new_collection_use_case;

pub use delete_photo_use_case::DeletePhotoUseCase;
pub use delete_pin_use_case::DeletePinUseCase;
pub use drop_pin_use_case::{DropPinUseCase, DroppedPin};
pub use new_collection_use_case::{NewCollectionUseCase, SearchOutcome};
