//! # Media Preload Module
//!
//! Fetches media ahead of user need without blocking the UI.
//!
//! ## Overview
//!
//! This module handles:
//! - Registration of catalog items and bounded-concurrency batch preloading
//! - Head-only prefetch of videos through a cancellable range request
//! - Full audio fetches persisted into a named cache shared with the
//!   fetch interceptor
//! - Per-item readiness, progress and revocable object URLs
//!
//! Nothing here fails to its caller. A sub-resource that could not be fetched
//! stays not-ready and its reason is visible through
//! [`MediaPreloader::item_report`].

pub mod cache_store;
pub mod error;
pub mod item;
pub mod prefetch;
pub mod scheduler;

pub use cache_store::CacheStore;
pub use error::{PreloadError, Result};
pub use item::{
    ContentItem, ItemReport, PrefetchOutcome, PreloadItem, PreloadProgress, PreloadedMedia,
    ResourceState,
};
pub use prefetch::{HeadPrefetch, RangePrefetcher};
pub use scheduler::MediaPreloader;
