//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the media preload core and the
//! platform it runs on. Each trait represents a capability the core requires
//! but that is implemented differently per host (desktop, browser).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Buffered and cancellable streaming fetch
//!
//! ### Storage
//! - [`CacheStorage`](cache::CacheStorage) - Registry of named persistent caches
//! - [`MediaCache`](cache::MediaCache) - Request-keyed response store
//! - [`ObjectUrlStore`](blob::ObjectUrlStore) - Revocable handles to in-memory media
//!
//! ### Interceptor Host
//! - [`WorkerScope`](worker::WorkerScope) - Activation and client-claim hooks
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ In Progress |
//! | Web      | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map platform failures onto it, distinguishing network from storage
//! failures so callers can report why a fetch did not complete.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared by the preloader and the interceptor across async tasks.

pub mod blob;
pub mod cache;
pub mod error;
pub mod http;
pub mod worker;

pub use error::BridgeError;

// Re-export commonly used types
pub use blob::ObjectUrlStore;
pub use cache::{CacheKey, CacheStorage, MediaCache};
pub use http::{
    ByteStream, CacheMode, HttpClient, HttpMethod, HttpRequest, HttpResponse, StreamingResponse,
};
pub use worker::{ImmediateScope, WorkerScope};
