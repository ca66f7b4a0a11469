//! Integration tests for logging and configuration

use core_runtime::config::{InterceptorConfig, PreloadConfig};
use core_runtime::logging::{init_logging, redact_url, LogFormat, LogLevel, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_logging_initializes_once() {
    // Only one global subscriber per process.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    init_logging(config.clone()).expect("first init succeeds");
    tracing::debug!(url = %redact_url("https://cdn.example.com/videos/a.mp4?sig=1"), "probe");

    assert!(matches!(init_logging(config), Err(Error::Logging(_))));
}

#[test]
fn test_redacted_urls_drop_signatures() {
    let signed = "https://cdn.example.com/audio/quote.mp3?X-Amz-Signature=deadbeef";
    let redacted = redact_url(signed);
    assert!(!redacted.contains("deadbeef"));
    assert!(redacted.ends_with("/audio/quote.mp3"));
}

#[test]
fn test_shared_cache_name_defaults_match() {
    let preload = PreloadConfig::default();
    let interceptor = InterceptorConfig::new("https://app.example.com");
    assert_eq!(preload.cache_name, interceptor.cache_name);
}
