//! # Interceptor Error Types

use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InterceptorError {
    /// The network fetch for a cache miss failed. The page sees a network error.
    #[error("Network fetch failed: {0}")]
    Network(#[source] BridgeError),

    /// Listing or deleting caches during activation failed.
    #[error("Cache storage error: {0}")]
    Storage(#[source] BridgeError),

    /// The host refused `skip_waiting` or `claim_clients`.
    #[error("Lifecycle hook failed: {0}")]
    Lifecycle(#[source] BridgeError),

    #[error(transparent)]
    Config(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, InterceptorError>;
