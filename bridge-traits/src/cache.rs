//! Named Response Cache Abstractions
//!
//! Mirrors the platform cache-storage model: a registry of named caches, each
//! mapping a request identity to a stored response. Hosts provide a persistent
//! implementation (browser Cache API, a directory on disk); the core never
//! assumes anything beyond single-operation atomicity of `match` and `put`.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::error::{BridgeError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Request identity used for cache lookups.
///
/// Two requests share an entry when method and URL (query string included)
/// are equal after canonicalization: scheme and host are lowercased, default
/// ports dropped and percent-encoding normalized. Fragments never reach the
/// server and are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    method: HttpMethod,
    url: String,
}

impl CacheKey {
    pub fn new(method: HttpMethod, url: &str) -> Self {
        let url = match Url::parse(url) {
            Ok(mut parsed) => {
                parsed.set_fragment(None);
                parsed.into()
            }
            Err(_) => url.split('#').next().unwrap_or(url).to_string(),
        };
        Self { method, url }
    }

    pub fn from_request(request: &HttpRequest) -> Self {
        Self::new(request.method, &request.url)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Reject entries the platform cache refuses to store.
///
/// Only GET requests are cacheable, and a partial (206) body must never be
/// stored because a later full read under the same key would receive it.
pub fn ensure_cacheable(request: &HttpRequest, response: &HttpResponse) -> Result<()> {
    if request.method != HttpMethod::Get {
        return Err(BridgeError::Storage(format!(
            "cannot cache {} request",
            request.method
        )));
    }
    if response.is_partial() {
        return Err(BridgeError::Storage(
            "cannot cache partial response".to_string(),
        ));
    }
    Ok(())
}

/// A single named cache.
#[async_trait]
pub trait MediaCache: Send + Sync {
    /// Look up the stored response for a request.
    async fn match_request(&self, request: &HttpRequest) -> Result<Option<HttpResponse>>;

    /// Store a response, replacing any previous entry for the same key.
    ///
    /// # Errors
    ///
    /// Fails for non-GET requests, partial responses, or when the store is
    /// out of space ([`BridgeError::QuotaExceeded`]).
    async fn put(&self, request: &HttpRequest, response: HttpResponse) -> Result<()>;

    /// Remove the entry for a request. Returns `true` if one existed.
    async fn delete(&self, request: &HttpRequest) -> Result<bool>;

    /// List stored request identities.
    async fn keys(&self) -> Result<Vec<CacheKey>>;
}

/// Registry of named caches.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::cache::CacheStorage;
///
/// async fn drop_old_generations(storage: &dyn CacheStorage, current: &str) -> Result<()> {
///     for name in storage.keys().await? {
///         if name != current {
///             storage.delete(&name).await?;
///         }
///     }
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a cache by name, creating it if it does not exist.
    async fn open(&self, name: &str) -> Result<Arc<dyn MediaCache>>;

    /// Check whether a cache with this name exists.
    async fn has(&self, name: &str) -> Result<bool>;

    /// Delete a cache and all its entries. Returns `true` if it existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// List the names of all existing caches.
    async fn keys(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_keeps_query_and_drops_fragment() {
        let a = CacheKey::new(HttpMethod::Get, "https://x.test/audio/1.mp3?v=2#t=10");
        let b = CacheKey::new(HttpMethod::Get, "https://x.test/audio/1.mp3?v=2");
        let c = CacheKey::new(HttpMethod::Get, "https://x.test/audio/1.mp3?v=3");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "GET https://x.test/audio/1.mp3?v=2");
    }

    #[test]
    fn test_cache_key_canonicalizes_equivalent_urls() {
        let canonical = CacheKey::new(HttpMethod::Get, "https://app.example.com/audio/1.mp3");
        for spelling in [
            "https://APP.example.com:443/audio/1.mp3",
            "HTTPS://app.example.com/audio/1.mp3#t=5",
            "https://app.example.com/audio/./1.mp3",
        ] {
            assert_eq!(CacheKey::new(HttpMethod::Get, spelling), canonical, "{}", spelling);
        }

        assert_ne!(
            CacheKey::new(HttpMethod::Get, "http://app.example.com/audio/1.mp3"),
            canonical
        );
        assert_eq!(
            CacheKey::new(HttpMethod::Get, "/audio/1.mp3#x").url(),
            "/audio/1.mp3"
        );
    }

    #[test]
    fn test_ensure_cacheable() {
        let get = HttpRequest::get("https://x.test/videos/a.mp4");
        let post = HttpRequest::new(HttpMethod::Post, "https://x.test/videos/a.mp4");

        assert!(ensure_cacheable(&get, &HttpResponse::new(200, "full")).is_ok());
        assert!(ensure_cacheable(&get, &HttpResponse::new(206, "part")).is_err());
        assert!(ensure_cacheable(&post, &HttpResponse::new(200, "full")).is_err());
    }
}
