//! Media services façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, cache storage,
//! object URLs, worker scope) into the preloader and the fetch interceptor,
//! handing both the same cache storage so entries the preloader stores are
//! served by the interceptor. Desktop apps typically enable the
//! `desktop-shims` feature, which depends on `bridge-desktop`.

pub mod config;
pub mod error;

pub use config::MediaServicesConfig;
pub use error::{Result, ServiceError};

use std::sync::Arc;

use bridge_traits::{CacheStorage, HttpClient, ObjectUrlStore, WorkerScope};
use core_interceptor::FetchInterceptor;
use core_preload::MediaPreloader;
use tracing::info;

/// Aggregated handle to all bridge dependencies the services require.
#[derive(Clone)]
pub struct MediaDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub cache_storage: Arc<dyn CacheStorage>,
    pub object_urls: Arc<dyn ObjectUrlStore>,
    pub worker_scope: Arc<dyn WorkerScope>,
}

impl MediaDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        cache_storage: Arc<dyn CacheStorage>,
        object_urls: Arc<dyn ObjectUrlStore>,
        worker_scope: Arc<dyn WorkerScope>,
    ) -> Self {
        Self {
            http_client,
            cache_storage,
            object_urls,
            worker_scope,
        }
    }
}

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct MediaServices {
    deps: Arc<MediaDependencies>,
    preloader: MediaPreloader,
    interceptor: Arc<FetchInterceptor>,
}

impl MediaServices {
    /// Build both components over one shared cache storage.
    pub fn new(config: MediaServicesConfig, deps: MediaDependencies) -> Result<Self> {
        config.validate()?;

        let preloader = MediaPreloader::new(
            config.preload,
            Arc::clone(&deps.http_client),
            Some(Arc::clone(&deps.cache_storage)),
            Arc::clone(&deps.object_urls),
        )?;
        let interceptor = FetchInterceptor::new(
            config.interceptor,
            Arc::clone(&deps.cache_storage),
            Arc::clone(&deps.http_client),
            Arc::clone(&deps.worker_scope),
        )?;

        info!(cache = %interceptor.cache_name(), "Media services ready");
        Ok(Self {
            deps: Arc::new(deps),
            preloader,
            interceptor: Arc::new(interceptor),
        })
    }

    pub fn preloader(&self) -> &MediaPreloader {
        &self.preloader
    }

    pub fn interceptor(&self) -> Arc<FetchInterceptor> {
        Arc::clone(&self.interceptor)
    }

    /// Access the bridge dependencies being used by the services.
    pub fn dependencies(&self) -> Arc<MediaDependencies> {
        Arc::clone(&self.deps)
    }
}

#[cfg(feature = "desktop-shims")]
mod desktop {
    use super::*;
    use bridge_desktop::{FsCacheStorage, MemoryObjectUrlStore, ReqwestHttpClient};
    use bridge_traits::ImmediateScope;
    use std::path::PathBuf;

    impl MediaServices {
        /// Desktop bootstrap with the on-disk cache in the user cache directory.
        pub fn desktop(config: MediaServicesConfig) -> Result<Self> {
            Self::desktop_with_storage(config, FsCacheStorage::in_default_location())
        }

        /// Desktop bootstrap with the on-disk cache under `root`.
        pub fn desktop_at(config: MediaServicesConfig, root: impl Into<PathBuf>) -> Result<Self> {
            Self::desktop_with_storage(config, FsCacheStorage::new(root))
        }

        fn desktop_with_storage(
            config: MediaServicesConfig,
            storage: FsCacheStorage,
        ) -> Result<Self> {
            let http = ReqwestHttpClient::new()
                .map_err(|e| ServiceError::InitializationFailed(e.to_string()))?;

            let deps = MediaDependencies::new(
                Arc::new(http),
                Arc::new(storage),
                Arc::new(MemoryObjectUrlStore::new()),
                Arc::new(ImmediateScope),
            );
            Self::new(config, deps)
        }
    }
}
