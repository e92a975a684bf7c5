//! Application services.

pub mod page_selector;
pub mod photo_image_fetcher;
pub mod task_slot;

pub use page_selector::PageSelector;
pub use photo_image_fetcher::{
    DEFAULT_MAX_CONCURRENT_DOWNLOADS, FetchOutcome, ImageFetchedEvent, PhotoImageFetcher,
};
pub use task_slot::TaskSlot;
