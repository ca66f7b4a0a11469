//! Combined configuration for the preloader and the interceptor.

use crate::error::{Result, ServiceError};
use core_runtime::config::{InterceptorConfig, PreloadConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaServicesConfig {
    #[serde(default)]
    pub preload: PreloadConfig,
    pub interceptor: InterceptorConfig,
}

impl MediaServicesConfig {
    /// Defaults for an app served from `origin`. Relative item URLs resolve
    /// against the origin.
    pub fn new(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            preload: PreloadConfig::default().with_base_url(origin.clone()),
            interceptor: InterceptorConfig::new(origin),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json).map_err(|e| {
            ServiceError::Config(core_runtime::Error::Config(format!(
                "Invalid services config: {}",
                e
            )))
        })?;
        if config.preload.base_url.is_none() {
            config.preload.base_url = Some(config.interceptor.origin.clone());
        }
        config.validate()?;
        Ok(config)
    }

    /// Move both components to a new cache generation.
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.preload.cache_name = name.clone();
        self.interceptor.cache_name = name;
        self
    }

    /// Validate both halves and the shared cache name.
    pub fn validate(&self) -> Result<()> {
        self.preload.validate()?;
        self.interceptor.validate()?;

        if self.preload.cache_name != self.interceptor.cache_name {
            return Err(ServiceError::CacheNameMismatch {
                preload: self.preload.cache_name.clone(),
                interceptor: self.interceptor.cache_name.clone(),
            });
        }
        Ok(())
    }
}
