//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-service`, `core-preload`, `core-interceptor`). Host
//! applications can depend on `media-preload-workspace` and enable the
//! documented features without wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service as service;

#[cfg(feature = "preloader")]
pub use core_preload as preload;

#[cfg(feature = "interceptor")]
pub use core_interceptor as interceptor;
