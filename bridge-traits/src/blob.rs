//! Object URL Abstraction
//!
//! Hands out locally owned, revocable references to in-memory media data, the
//! way `URL.createObjectURL` does in a browser. Every handle created must be
//! revoked exactly once by its owner; an unrevoked handle pins its data until
//! the execution context ends.

use bytes::Bytes;

use crate::error::Result;

/// Store of revocable object URLs.
pub trait ObjectUrlStore: Send + Sync {
    /// Register `data` and return a new unique handle for it.
    fn create_object_url(&self, data: Bytes, content_type: Option<&str>) -> Result<String>;

    /// Release a handle. Revoking an unknown handle is a no-op.
    fn revoke_object_url(&self, url: &str);
}
