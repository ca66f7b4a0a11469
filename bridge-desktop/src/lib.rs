//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest`, with cancellable streaming bodies
//! - `CacheStorage` backed by a directory per named cache (`FsCacheStorage`)
//!   or held in memory (`MemoryCacheStorage`)
//! - `ObjectUrlStore` as an in-process `blob:` handle registry
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FsCacheStorage, MemoryObjectUrlStore, ReqwestHttpClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let http = Arc::new(ReqwestHttpClient::new()?);
//!     let caches = Arc::new(FsCacheStorage::in_default_location());
//!     let blobs = Arc::new(MemoryObjectUrlStore::new());
//!
//!     // Hand these to core-service::MediaServices
//! }
//! ```

mod blob;
mod cache;
mod http;

pub use blob::MemoryObjectUrlStore;
pub use cache::{FsCacheStorage, MemoryCacheStorage};
pub use http::ReqwestHttpClient;
