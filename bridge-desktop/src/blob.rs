//! In-process object URL registry

use bridge_traits::{blob::ObjectUrlStore, error::Result};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct BlobEntry {
    data: Bytes,
    content_type: Option<String>,
}

/// Object URL store holding blobs in memory under `blob:<uuid>` handles.
///
/// Players resolve a handle back to its bytes with [`resolve`]; the data is
/// released when the handle is revoked.
///
/// [`resolve`]: MemoryObjectUrlStore::resolve
#[derive(Debug, Default)]
pub struct MemoryObjectUrlStore {
    blobs: Mutex<HashMap<String, BlobEntry>>,
}

impl MemoryObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes and content type behind a live handle.
    pub fn resolve(&self, url: &str) -> Option<(Bytes, Option<String>)> {
        self.blobs
            .lock()
            .get(url)
            .map(|entry| (entry.data.clone(), entry.content_type.clone()))
    }

    /// Number of live (unrevoked) handles.
    pub fn live_count(&self) -> usize {
        self.blobs.lock().len()
    }

    /// Total bytes pinned by live handles.
    pub fn live_bytes(&self) -> usize {
        self.blobs.lock().values().map(|entry| entry.data.len()).sum()
    }
}

impl ObjectUrlStore for MemoryObjectUrlStore {
    fn create_object_url(&self, data: Bytes, content_type: Option<&str>) -> Result<String> {
        let url = format!("blob:{}", Uuid::new_v4());
        debug!(%url, bytes = data.len(), "Created object URL");
        self.blobs.lock().insert(
            url.clone(),
            BlobEntry {
                data,
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        if self.blobs.lock().remove(url).is_some() {
            debug!(%url, "Revoked object URL");
        }
    }
}
