//! # Cache Store Adapter
//!
//! Get-or-fetch-and-store over a persistent named cache. Entries are keyed by
//! request identity (method plus URL with query string), so the interceptor
//! sharing the same cache name sees every asset stored here.

use crate::error::{PreloadError, Result};
use bridge_traits::{CacheStorage, HttpClient, HttpRequest, HttpResponse};
use core_runtime::logging::redact_url;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

#[derive(Clone)]
pub struct CacheStore {
    http: Arc<dyn HttpClient>,
    storage: Option<Arc<dyn CacheStorage>>,
    cache_name: String,
}

impl CacheStore {
    /// Create an adapter. Without `storage` every call goes to the network.
    pub fn new(
        http: Arc<dyn HttpClient>,
        storage: Option<Arc<dyn CacheStorage>>,
        cache_name: impl Into<String>,
    ) -> Self {
        Self {
            http,
            storage,
            cache_name: cache_name.into(),
        }
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn has_storage(&self) -> bool {
        self.storage.is_some()
    }

    /// Return the cached response for `url`, or fetch, store and return it.
    ///
    /// Never fails: any network, storage or quota error yields `None`, as
    /// does a non-success status.
    pub async fn fetch_and_cache(&self, url: &str) -> Option<HttpResponse> {
        match self.try_fetch_and_cache(url).await {
            Ok(response) => Some(response),
            Err(e) => {
                debug!(url = %redact_url(url), error = %e, "fetch_and_cache yielded nothing");
                None
            }
        }
    }

    /// Same as [`fetch_and_cache`](Self::fetch_and_cache) but reports why no
    /// response was produced.
    #[instrument(skip(self), fields(url = %redact_url(url), cache = %self.cache_name))]
    pub async fn try_fetch_and_cache(&self, url: &str) -> Result<HttpResponse> {
        let request = HttpRequest::get(url);

        let Some(storage) = &self.storage else {
            let response = self
                .http
                .execute(request)
                .await
                .map_err(PreloadError::from_network)?;
            return ok_or_status(response);
        };

        let cache = storage
            .open(&self.cache_name)
            .await
            .map_err(PreloadError::from_storage)?;

        if let Some(cached) = cache
            .match_request(&request)
            .await
            .map_err(PreloadError::from_storage)?
        {
            debug!(bytes = cached.body.len(), "Cache hit");
            return Ok(cached);
        }

        let response = self
            .http
            .execute(request.clone())
            .await
            .map_err(PreloadError::from_network)?;

        if response.status == 200 {
            if let Err(e) = cache.put(&request, response.clone()).await {
                warn!(error = %e, "Failed to store response");
                return Err(PreloadError::from_storage(e));
            }
            debug!(bytes = response.body.len(), "Stored network response");
            return Ok(response);
        }

        ok_or_status(response)
    }
}

fn ok_or_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(PreloadError::HttpStatus(response.status))
    }
}
