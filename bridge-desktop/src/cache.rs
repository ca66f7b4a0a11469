//! Named Cache Implementations
//!
//! `FsCacheStorage` keeps one directory per named cache under a root
//! directory; `MemoryCacheStorage` keeps everything in process memory.

use async_trait::async_trait;
use bridge_traits::{
    cache::{ensure_cacheable, CacheKey, CacheStorage, MediaCache},
    error::{BridgeError, Result},
    http::{HttpMethod, HttpRequest, HttpResponse},
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

const META_EXTENSION: &str = "meta";
const BODY_EXTENSION: &str = "body";

// ============================================================================
// Filesystem-backed storage
// ============================================================================

/// Persistent cache storage rooted at a directory.
///
/// Layout: `<root>/<hex(cache name)>/<sha256(key)>.{meta,body}`. A body is
/// always renamed into place before its metadata, so a readable `.meta` file
/// implies a complete entry.
#[derive(Debug, Clone)]
pub struct FsCacheStorage {
    root: PathBuf,
}

impl FsCacheStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Storage under the platform cache directory.
    pub fn in_default_location() -> Self {
        let root = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("media-preload-core")
            .join("caches");
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, name: &str) -> PathBuf {
        self.root.join(hex::encode(name.as_bytes()))
    }
}

#[async_trait]
impl CacheStorage for FsCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn MediaCache>> {
        let dir = self.cache_dir(name);
        fs::create_dir_all(&dir).await?;
        Ok(Arc::new(FsMediaCache { dir }))
    }

    async fn has(&self, name: &str) -> Result<bool> {
        match fs::metadata(self.cache_dir(name)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        match fs::remove_dir_all(self.cache_dir(name)).await {
            Ok(()) => {
                debug!(cache = name, "Deleted cache directory");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let dir_name = entry.file_name();
            let decoded = dir_name
                .to_str()
                .and_then(|s| hex::decode(s).ok())
                .and_then(|bytes| String::from_utf8(bytes).ok());
            match decoded {
                Some(name) => names.push(name),
                None => warn!(dir = ?dir_name, "Skipping foreign directory in cache root"),
            }
        }
        names.sort();
        Ok(names)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    headers: HashMap<String, String>,
}

struct FsMediaCache {
    dir: PathBuf,
}

impl FsMediaCache {
    fn entry_paths(&self, key: &CacheKey) -> (PathBuf, PathBuf) {
        let digest = Sha256::digest(key.to_string().as_bytes());
        let stem = hex::encode(digest);
        (
            self.dir.join(format!("{}.{}", stem, META_EXTENSION)),
            self.dir.join(format!("{}.{}", stem, BODY_EXTENSION)),
        )
    }

    fn temp_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.tmp", uuid::Uuid::new_v4()))
    }
}

#[async_trait]
impl MediaCache for FsMediaCache {
    async fn match_request(&self, request: &HttpRequest) -> Result<Option<HttpResponse>> {
        let (meta_path, body_path) = self.entry_paths(&CacheKey::from_request(request));

        let raw = match fs::read(&meta_path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let meta: EntryMeta = serde_json::from_slice(&raw)
            .map_err(|e| BridgeError::Storage(format!("Corrupt cache entry: {}", e)))?;

        let body = match fs::read(&body_path).await {
            Ok(body) => body,
            // Deleted between the two reads.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(HttpResponse {
            status: meta.status,
            headers: meta.headers,
            body: body.into(),
        }))
    }

    async fn put(&self, request: &HttpRequest, response: HttpResponse) -> Result<()> {
        ensure_cacheable(request, &response)?;

        let key = CacheKey::from_request(request);
        let (meta_path, body_path) = self.entry_paths(&key);
        let meta = EntryMeta {
            url: key.url().to_string(),
            status: response.status,
            headers: response.headers,
        };
        let meta_bytes = serde_json::to_vec(&meta)
            .map_err(|e| BridgeError::Storage(format!("Failed to encode cache entry: {}", e)))?;

        let body_tmp = self.temp_path();
        let meta_tmp = self.temp_path();
        fs::write(&body_tmp, &response.body).await?;
        fs::write(&meta_tmp, meta_bytes).await?;
        fs::rename(&body_tmp, &body_path).await?;
        fs::rename(&meta_tmp, &meta_path).await?;

        debug!(key = %key, bytes = response.body.len(), "Stored cache entry");
        Ok(())
    }

    async fn delete(&self, request: &HttpRequest) -> Result<bool> {
        let (meta_path, body_path) = self.entry_paths(&CacheKey::from_request(request));
        let existed = match fs::remove_file(&meta_path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        match fs::remove_file(&body_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(existed)
    }

    async fn keys(&self) -> Result<Vec<CacheKey>> {
        let mut entries = fs::read_dir(&self.dir).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(META_EXTENSION) {
                continue;
            }
            let raw = fs::read(&path).await?;
            match serde_json::from_slice::<EntryMeta>(&raw) {
                Ok(meta) => keys.push(CacheKey::new(HttpMethod::Get, &meta.url)),
                Err(e) => warn!(path = ?path, error = %e, "Skipping corrupt cache entry"),
            }
        }
        Ok(keys)
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

/// Process-local cache storage.
///
/// An optional byte quota is shared by all caches; a `put` that would exceed
/// it fails with [`BridgeError::QuotaExceeded`].
#[derive(Default)]
pub struct MemoryCacheStorage {
    caches: Mutex<HashMap<String, Arc<MemoryMediaCache>>>,
    quota: Option<Arc<Quota>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            caches: Mutex::new(HashMap::new()),
            quota: Some(Arc::new(Quota {
                limit: quota_bytes,
                used: Mutex::new(0),
            })),
        }
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<Arc<dyn MediaCache>> {
        let mut caches = self.caches.lock();
        let cache = caches
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(MemoryMediaCache {
                    entries: Mutex::new(HashMap::new()),
                    quota: self.quota.clone(),
                })
            })
            .clone();
        Ok(cache)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.caches.lock().contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let removed = self.caches.lock().remove(name);
        if let Some(cache) = &removed {
            cache.clear();
        }
        Ok(removed.is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.caches.lock().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

struct Quota {
    limit: u64,
    used: Mutex<u64>,
}

struct MemoryMediaCache {
    entries: Mutex<HashMap<CacheKey, HttpResponse>>,
    quota: Option<Arc<Quota>>,
}

impl MemoryMediaCache {
    fn clear(&self) {
        let drained: u64 = self
            .entries
            .lock()
            .drain()
            .map(|(_, response)| response.body.len() as u64)
            .sum();
        if let Some(quota) = &self.quota {
            let mut used = quota.used.lock();
            *used = used.saturating_sub(drained);
        }
    }
}

#[async_trait]
impl MediaCache for MemoryMediaCache {
    async fn match_request(&self, request: &HttpRequest) -> Result<Option<HttpResponse>> {
        Ok(self
            .entries
            .lock()
            .get(&CacheKey::from_request(request))
            .cloned())
    }

    async fn put(&self, request: &HttpRequest, response: HttpResponse) -> Result<()> {
        ensure_cacheable(request, &response)?;

        let key = CacheKey::from_request(request);
        let mut entries = self.entries.lock();
        let replaced = entries
            .get(&key)
            .map(|previous| previous.body.len() as u64)
            .unwrap_or(0);
        let incoming = response.body.len() as u64;

        if let Some(quota) = &self.quota {
            let mut used = quota.used.lock();
            let projected = used.saturating_sub(replaced) + incoming;
            if projected > quota.limit {
                return Err(BridgeError::QuotaExceeded);
            }
            *used = projected;
        }

        entries.insert(key, response);
        Ok(())
    }

    async fn delete(&self, request: &HttpRequest) -> Result<bool> {
        let removed = self
            .entries
            .lock()
            .remove(&CacheKey::from_request(request));
        if let (Some(response), Some(quota)) = (&removed, &self.quota) {
            let mut used = quota.used.lock();
            *used = used.saturating_sub(response.body.len() as u64);
        }
        Ok(removed.is_some())
    }

    async fn keys(&self) -> Result<Vec<CacheKey>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}
