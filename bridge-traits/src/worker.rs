//! Request Interceptor Host Hooks
//!
//! Lifecycle operations a host exposes to an installed request interceptor
//! (a browser service worker scope, or an in-process proxy on desktop).

use async_trait::async_trait;

use crate::error::Result;

/// Host scope the interceptor runs in.
#[async_trait]
pub trait WorkerScope: Send + Sync {
    /// Activate immediately instead of waiting for existing clients to close.
    async fn skip_waiting(&self) -> Result<()>;

    /// Route every open client's future requests through this interceptor
    /// without a reload.
    async fn claim_clients(&self) -> Result<()>;
}

/// Scope for hosts with no client bookkeeping; both hooks succeed trivially.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateScope;

#[async_trait]
impl WorkerScope for ImmediateScope {
    async fn skip_waiting(&self) -> Result<()> {
        Ok(())
    }

    async fn claim_clients(&self) -> Result<()> {
        Ok(())
    }
}
