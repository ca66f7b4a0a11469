//! # Cache-First Fetch Interceptor
//!
//! Answers same-origin media requests from the shared named cache, falling
//! back to the network and storing complete 200 responses. It also owns the
//! cache generation: activation deletes every cache whose name differs from
//! the configured one.
//!
//! ## Lifecycle
//!
//! ```text
//! Parsed ──install()──▶ Installed ──activate()──▶ Activated
//! ```
//!
//! Fetches are handled in every state.

use crate::error::{InterceptorError, Result};
use crate::route::{BypassReason, MediaRoutes};
use bridge_traits::{CacheStorage, HttpClient, HttpRequest, HttpResponse, MediaCache, WorkerScope};
use core_runtime::config::InterceptorConfig;
use core_runtime::logging::redact_url;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    Parsed,
    Installed,
    Activated,
}

/// What the host should do with a request.
#[derive(Debug, Clone)]
pub enum Interception {
    /// Let the platform handle the request untouched.
    Bypass(BypassReason),
    /// Answer with this response.
    Respond(HttpResponse),
}

impl Interception {
    pub fn is_bypass(&self) -> bool {
        matches!(self, Interception::Bypass(_))
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        match self {
            Interception::Respond(response) => Some(response),
            Interception::Bypass(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivationReport {
    /// Stale cache generations that were removed.
    pub deleted: Vec<String>,
}

pub struct FetchInterceptor {
    cache_name: String,
    routes: MediaRoutes,
    storage: Arc<dyn CacheStorage>,
    http: Arc<dyn HttpClient>,
    scope: Arc<dyn WorkerScope>,
    state: Mutex<LifecycleState>,
}

impl FetchInterceptor {
    pub fn new(
        config: InterceptorConfig,
        storage: Arc<dyn CacheStorage>,
        http: Arc<dyn HttpClient>,
        scope: Arc<dyn WorkerScope>,
    ) -> Result<Self> {
        config.validate()?;
        let origin = config.origin_url()?;

        Ok(Self {
            cache_name: config.cache_name,
            routes: MediaRoutes::new(origin, config.media_prefixes),
            storage,
            http,
            scope,
            state: Mutex::new(LifecycleState::Parsed),
        })
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn routes(&self) -> &MediaRoutes {
        &self.routes
    }

    /// Request immediate activation, skipping the waiting phase.
    #[instrument(skip(self))]
    pub async fn install(&self) -> Result<()> {
        self.scope
            .skip_waiting()
            .await
            .map_err(InterceptorError::Lifecycle)?;
        *self.state.lock() = LifecycleState::Installed;
        info!("Interceptor installed");
        Ok(())
    }

    /// Delete every cache generation but the current one, then take control
    /// of all open clients.
    #[instrument(skip(self), fields(cache = %self.cache_name))]
    pub async fn activate(&self) -> Result<ActivationReport> {
        let names = self
            .storage
            .keys()
            .await
            .map_err(InterceptorError::Storage)?;

        let mut report = ActivationReport::default();
        for name in names.into_iter().filter(|name| *name != self.cache_name) {
            self.storage
                .delete(&name)
                .await
                .map_err(InterceptorError::Storage)?;
            debug!(stale = %name, "Deleted stale cache");
            report.deleted.push(name);
        }

        self.scope
            .claim_clients()
            .await
            .map_err(InterceptorError::Lifecycle)?;
        *self.state.lock() = LifecycleState::Activated;

        info!(deleted = report.deleted.len(), "Interceptor activated");
        Ok(report)
    }

    /// Route a request: bypass it, or answer it cache-first.
    ///
    /// # Errors
    ///
    /// Only a failed network fetch on a cache miss is an error; cache
    /// failures fall back to the network.
    #[instrument(skip(self, request), fields(method = %request.method, url = %redact_url(&request.url)))]
    pub async fn handle_fetch(&self, request: HttpRequest) -> Result<Interception> {
        if let Some(reason) = self.routes.bypass_reason(&request) {
            debug!(%reason, "Bypassing");
            return Ok(Interception::Bypass(reason));
        }

        self.cache_first(request).await.map(Interception::Respond)
    }

    async fn cache_first(&self, request: HttpRequest) -> Result<HttpResponse> {
        let cache = match self.storage.open(&self.cache_name).await {
            Ok(cache) => Some(cache),
            Err(e) => {
                warn!(error = %e, "Cache unavailable, serving from network");
                None
            }
        };

        if let Some(cache) = &cache {
            match cache.match_request(&request).await {
                Ok(Some(cached)) => {
                    debug!("Cache hit");
                    return Ok(cached);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Cache lookup failed"),
            }
        }

        let response = self
            .http
            .execute(request.clone())
            .await
            .map_err(InterceptorError::Network)?;

        if response.status == 200 {
            if let Some(cache) = &cache {
                store(cache.as_ref(), &request, &response).await;
            }
        } else {
            debug!(status = response.status, "Not caching response");
        }

        Ok(response)
    }
}

async fn store(cache: &dyn MediaCache, request: &HttpRequest, response: &HttpResponse) {
    match cache.put(request, response.clone()).await {
        Ok(()) => debug!(bytes = response.body.len(), "Stored network response"),
        Err(e) => warn!(error = %e, "Failed to store response"),
    }
}
