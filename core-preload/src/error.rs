//! # Preload Error Types
//!
//! Failures recorded against individual sub-resources. None of them escape the
//! scheduler; they end up in [`ResourceState::Failed`](crate::item::ResourceState)
//! or in the head-prefetch outcome.

use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreloadError {
    // ========================================================================
    // Network Errors
    // ========================================================================
    /// The request could not be sent or the connection dropped.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// Success status but no readable body.
    #[error("Response has no readable body")]
    MissingBody,

    /// A chunk of a streamed body could not be read.
    #[error("Stream read failed: {0}")]
    StreamRead(String),

    /// The transfer was cancelled before a response arrived.
    #[error("Request aborted")]
    Aborted,

    // ========================================================================
    // Storage Errors
    // ========================================================================
    #[error("Cache storage error: {0}")]
    Storage(String),

    #[error("Cache storage quota exceeded")]
    QuotaExceeded,

    /// The host refused to mint an object URL.
    #[error("Object URL creation failed: {0}")]
    ObjectUrl(String),

    #[error(transparent)]
    Config(#[from] core_runtime::Error),
}

impl PreloadError {
    /// Map a bridge failure raised by the HTTP client.
    pub fn from_network(err: BridgeError) -> Self {
        match err {
            BridgeError::Aborted => PreloadError::Aborted,
            other => PreloadError::Network(other.to_string()),
        }
    }

    /// Map a bridge failure raised by cache storage.
    pub fn from_storage(err: BridgeError) -> Self {
        match err {
            BridgeError::QuotaExceeded => PreloadError::QuotaExceeded,
            other => PreloadError::Storage(other.to_string()),
        }
    }

    /// Returns `true` if this error is due to network issues.
    pub fn is_network_error(&self) -> bool {
        matches!(
            self,
            PreloadError::Network(_)
                | PreloadError::HttpStatus(_)
                | PreloadError::MissingBody
                | PreloadError::StreamRead(_)
                | PreloadError::Aborted
        )
    }

    /// Returns `true` if this error came from the cache or blob store.
    pub fn is_storage_error(&self) -> bool {
        matches!(
            self,
            PreloadError::Storage(_) | PreloadError::QuotaExceeded | PreloadError::ObjectUrl(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PreloadError>;
