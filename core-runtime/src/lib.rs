//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the media preload core:
//! - Logging and tracing infrastructure
//! - Configuration for the preloader and the fetch interceptor
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on. It
//! owns the tunable constants (batch size, pacing, head-prefetch threshold,
//! cache generation name) and the logging conventions used throughout the
//! workspace.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
