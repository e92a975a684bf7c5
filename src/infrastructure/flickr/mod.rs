//! Flickr photo search adapter.

mod client;
mod dto;

pub use client::{FLICKR_API_BASE, FlickrClient};
