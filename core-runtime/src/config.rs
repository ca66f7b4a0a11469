//! # Core Configuration Module
//!
//! Tunables for the preloader and the cache-first fetch interceptor.
//!
//! ## Overview
//!
//! Both components share a persistent named cache. The cache name is the
//! generation identifier: the preloader and the interceptor must be configured
//! with the same name to share entries, and bumping it makes the interceptor
//! delete every older generation on its next activation.
//!
//! Configs follow a builder pattern with fail-fast validation and can be
//! deserialized from JSON (durations in milliseconds, camelCase keys):
//!
//! ```
//! use core_runtime::config::PreloadConfig;
//!
//! let config = PreloadConfig::from_json(r#"{ "maxConcurrent": 3, "batchDelayMs": 250 }"#)
//!     .expect("valid config");
//! assert_eq!(config.max_concurrent, 3);
//! assert_eq!(config.head_prefetch_bytes, 2 * 1024 * 1024);
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Current media cache generation.
pub const DEFAULT_MEDIA_CACHE_NAME: &str = "media-preload-v1";

/// Leading bytes of a video fetched to warm the player's first segment (2 MiB).
pub const DEFAULT_HEAD_PREFETCH_BYTES: u64 = 2 * 1024 * 1024;

/// Items preloaded concurrently in one batch.
pub const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Pause between consecutive batches.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_millis(500);

/// Path prefixes the interceptor answers from cache.
pub const DEFAULT_MEDIA_PREFIXES: &[&str] = &["/videos/", "/audio/"];

/// Preloader configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreloadConfig {
    /// Maximum items in flight per batch (default: 2)
    pub max_concurrent: usize,

    /// Delay between batches (default: 500ms)
    #[serde(rename = "batchDelayMs", with = "duration_millis")]
    pub batch_delay: Duration,

    /// Head-prefetch threshold in bytes (default: 2 MiB)
    pub head_prefetch_bytes: u64,

    /// Named cache used for full audio assets
    pub cache_name: String,

    /// Base against which relative item URLs are resolved (e.g. the app origin)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            batch_delay: DEFAULT_BATCH_DELAY,
            head_prefetch_bytes: DEFAULT_HEAD_PREFETCH_BYTES,
            cache_name: DEFAULT_MEDIA_CACHE_NAME.to_string(),
            base_url: None,
        }
    }
}

impl PreloadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid preload config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_concurrent(mut self, count: usize) -> Self {
        self.max_concurrent = count;
        self
    }

    pub fn with_batch_delay(mut self, delay: Duration) -> Self {
        self.batch_delay = delay;
        self
    }

    pub fn with_head_prefetch_bytes(mut self, bytes: u64) -> Self {
        self.head_prefetch_bytes = bytes;
        self
    }

    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = Some(base.into());
        self
    }

    /// Resolve an item URL the way a document does against its base.
    ///
    /// Absolute URLs come back in canonical form. Relative URLs without a
    /// base, and anything unparsable, are returned unchanged.
    pub fn resolve_url(&self, url: &str) -> String {
        if let Ok(absolute) = Url::parse(url) {
            return absolute.into();
        }
        self.base_url
            .as_deref()
            .and_then(|base| Url::parse(base).ok())
            .and_then(|base| base.join(url).ok())
            .map(String::from)
            .unwrap_or_else(|| url.to_string())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent == 0 {
            return Err(Error::Config(
                "max_concurrent must be at least 1".to_string(),
            ));
        }

        if self.head_prefetch_bytes == 0 {
            return Err(Error::Config(
                "head_prefetch_bytes must be greater than 0".to_string(),
            ));
        }

        if let Some(base) = &self.base_url {
            let parsed = Url::parse(base).map_err(|e| Error::InvalidUrl {
                field: "base_url",
                value: base.clone(),
                reason: e.to_string(),
            })?;
            if parsed.cannot_be_a_base() {
                return Err(Error::InvalidUrl {
                    field: "base_url",
                    value: base.clone(),
                    reason: "not a hierarchical URL".to_string(),
                });
            }
        }

        validate_cache_name(&self.cache_name)
    }
}

/// Fetch interceptor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptorConfig {
    /// Current cache generation; every other named cache is deleted on activation
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Origin the interceptor serves (e.g. `https://app.example.com`)
    pub origin: String,

    /// Path prefixes answered cache-first
    #[serde(default = "default_media_prefixes")]
    pub media_prefixes: Vec<String>,
}

impl InterceptorConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            cache_name: default_cache_name(),
            origin: origin.into(),
            media_prefixes: default_media_prefixes(),
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid interceptor config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    pub fn with_media_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.media_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Parsed origin URL.
    pub fn origin_url(&self) -> Result<Url> {
        let url = Url::parse(&self.origin).map_err(|e| Error::InvalidUrl {
            field: "origin",
            value: self.origin.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidUrl {
                field: "origin",
                value: self.origin.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(url)
    }

    pub fn validate(&self) -> Result<()> {
        validate_cache_name(&self.cache_name)?;
        self.origin_url()?;

        if self.media_prefixes.is_empty() {
            return Err(Error::Config(
                "at least one media prefix is required".to_string(),
            ));
        }

        if let Some(bad) = self
            .media_prefixes
            .iter()
            .find(|p| !p.starts_with('/') || !p.ends_with('/'))
        {
            return Err(Error::Config(format!(
                "media prefix '{}' must start and end with '/'",
                bad
            )));
        }

        Ok(())
    }
}

fn validate_cache_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Config("cache_name cannot be empty".to_string()));
    }
    Ok(())
}

fn default_cache_name() -> String {
    DEFAULT_MEDIA_CACHE_NAME.to_string()
}

fn default_media_prefixes() -> Vec<String> {
    DEFAULT_MEDIA_PREFIXES.iter().map(|p| p.to_string()).collect()
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        duration: &Duration,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preload_config() {
        let config = PreloadConfig::default();
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.batch_delay, Duration::from_millis(500));
        assert_eq!(config.head_prefetch_bytes, 2_097_152);
        assert_eq!(config.cache_name, DEFAULT_MEDIA_CACHE_NAME);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_preload_config_builder() {
        let config = PreloadConfig::new()
            .with_max_concurrent(4)
            .with_batch_delay(Duration::from_millis(10))
            .with_head_prefetch_bytes(1024)
            .with_cache_name("media-v2");

        assert_eq!(config.max_concurrent, 4);
        assert_eq!(config.batch_delay, Duration::from_millis(10));
        assert_eq!(config.head_prefetch_bytes, 1024);
        assert_eq!(config.cache_name, "media-v2");
    }

    #[test]
    fn test_preload_config_validation() {
        assert!(PreloadConfig::new().with_max_concurrent(0).validate().is_err());
        assert!(PreloadConfig::new()
            .with_head_prefetch_bytes(0)
            .validate()
            .is_err());
        assert!(PreloadConfig::new().with_cache_name("  ").validate().is_err());
    }

    #[test]
    fn test_preload_config_json_round_trip_uses_millis() {
        let json = serde_json::to_value(PreloadConfig::default()).unwrap();
        assert_eq!(json["batchDelayMs"], 500);
        assert_eq!(json["maxConcurrent"], 2);

        let config = PreloadConfig::from_json(r#"{"batchDelayMs": 0}"#).unwrap();
        assert_eq!(config.batch_delay, Duration::ZERO);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);

        assert!(PreloadConfig::from_json(r#"{"maxConcurrent": 0}"#).is_err());
        assert!(PreloadConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_preload_config_resolves_relative_urls() {
        let config = PreloadConfig::new().with_base_url("https://app.example.com/library/");
        assert!(config.validate().is_ok());

        assert_eq!(
            config.resolve_url("/audio/1.mp3"),
            "https://app.example.com/audio/1.mp3"
        );
        assert_eq!(
            config.resolve_url("audio/1.mp3?v=2"),
            "https://app.example.com/library/audio/1.mp3?v=2"
        );
        assert_eq!(
            config.resolve_url("https://APP.example.com:443/audio/1.mp3"),
            "https://app.example.com/audio/1.mp3"
        );

        let no_base = PreloadConfig::new();
        assert_eq!(no_base.resolve_url("/audio/1.mp3"), "/audio/1.mp3");

        let json = PreloadConfig::from_json(r#"{"baseUrl": "https://app.example.com"}"#).unwrap();
        assert_eq!(json.base_url.as_deref(), Some("https://app.example.com"));
    }

    #[test]
    fn test_preload_config_rejects_bad_base_url() {
        assert!(matches!(
            PreloadConfig::new().with_base_url("/relative").validate(),
            Err(Error::InvalidUrl { field: "base_url", .. })
        ));
        assert!(PreloadConfig::new()
            .with_base_url("mailto:someone@example.com")
            .validate()
            .is_err());
    }

    #[test]
    fn test_interceptor_config_defaults() {
        let config = InterceptorConfig::new("https://app.example.com");
        assert_eq!(config.cache_name, DEFAULT_MEDIA_CACHE_NAME);
        assert_eq!(config.media_prefixes, vec!["/videos/", "/audio/"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_interceptor_config_validation() {
        assert!(matches!(
            InterceptorConfig::new("not a url").validate(),
            Err(Error::InvalidUrl { field: "origin", .. })
        ));
        assert!(InterceptorConfig::new("ftp://app.example.com")
            .validate()
            .is_err());
        assert!(InterceptorConfig::new("https://app.example.com")
            .with_media_prefixes(["videos/"])
            .validate()
            .is_err());
        assert!(InterceptorConfig::new("https://app.example.com")
            .with_media_prefixes(Vec::<String>::new())
            .validate()
            .is_err());
    }

    #[test]
    fn test_interceptor_config_from_json() {
        let config = InterceptorConfig::from_json(
            r#"{"origin": "https://app.example.com", "cacheName": "media-v9"}"#,
        )
        .unwrap();
        assert_eq!(config.cache_name, "media-v9");
        assert_eq!(config.media_prefixes.len(), 2);

        assert!(InterceptorConfig::from_json(r#"{"cacheName": "x"}"#).is_err());
    }
}
