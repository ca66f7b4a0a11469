//! Tests for cache-first interception and cache generation lifecycle

use async_trait::async_trait;
use bridge_desktop::MemoryCacheStorage;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::{
    CacheStorage, HttpClient, HttpMethod, HttpRequest, HttpResponse, ImmediateScope, MediaCache,
    WorkerScope,
};
use core_interceptor::{
    BypassReason, FetchInterceptor, Interception, InterceptorError, LifecycleState,
};
use core_runtime::config::InterceptorConfig;
use mockall::mock;
use std::sync::Arc;

mock! {
    Http {}

    #[async_trait]
    impl HttpClient for Http {
        async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
    }
}

mock! {
    Storage {}

    #[async_trait]
    impl CacheStorage for Storage {
        async fn open(&self, name: &str) -> BridgeResult<Arc<dyn MediaCache>>;
        async fn has(&self, name: &str) -> BridgeResult<bool>;
        async fn delete(&self, name: &str) -> BridgeResult<bool>;
        async fn keys(&self) -> BridgeResult<Vec<String>>;
    }
}

mock! {
    Scope {}

    #[async_trait]
    impl WorkerScope for Scope {
        async fn skip_waiting(&self) -> BridgeResult<()>;
        async fn claim_clients(&self) -> BridgeResult<()>;
    }
}

const ORIGIN: &str = "https://app.example.com";
const AUDIO: &str = "https://app.example.com/audio/quote-1.mp3";

fn config() -> InterceptorConfig {
    InterceptorConfig::new(ORIGIN)
}

fn interceptor(
    storage: Arc<dyn CacheStorage>,
    http: Arc<dyn HttpClient>,
    scope: Arc<dyn WorkerScope>,
) -> FetchInterceptor {
    FetchInterceptor::new(config(), storage, http, scope).unwrap()
}

#[tokio::test]
async fn test_bypassed_requests_touch_neither_cache_nor_network() {
    // Mocks without expectations panic on any call.
    let interceptor = interceptor(
        Arc::new(MockStorage::new()),
        Arc::new(MockHttp::new()),
        Arc::new(ImmediateScope),
    );

    let cases = [
        (
            HttpRequest::get("https://app.example.com/videos/a.mp4").range(0, 2_097_151),
            BypassReason::RangeRequest,
        ),
        (
            HttpRequest::new(HttpMethod::Post, AUDIO),
            BypassReason::NonGet,
        ),
        (
            HttpRequest::get("https://cdn.example.com/audio/quote-1.mp3"),
            BypassReason::CrossOrigin,
        ),
        (
            HttpRequest::get("https://app.example.com/index.html"),
            BypassReason::NotMedia,
        ),
        (HttpRequest::get("not a url"), BypassReason::InvalidUrl),
    ];

    for (request, expected) in cases {
        match interceptor.handle_fetch(request).await.unwrap() {
            Interception::Bypass(reason) => assert_eq!(reason, expected),
            Interception::Respond(_) => panic!("expected bypass for {:?}", expected),
        }
    }
}

#[tokio::test]
async fn test_miss_fetches_and_stores_then_hit_serves_cache() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .withf(|req| req.url == AUDIO)
        .times(1)
        .returning(|_| {
            Ok(HttpResponse::new(200, &b"quote"[..]).with_header("Content-Type", "audio/mpeg"))
        });

    let storage = Arc::new(MemoryCacheStorage::new());
    let interceptor = interceptor(storage.clone(), Arc::new(http), Arc::new(ImmediateScope));

    let first = interceptor.handle_fetch(HttpRequest::get(AUDIO)).await.unwrap();
    assert_eq!(first.response().unwrap().body.as_ref(), b"quote");

    let second = interceptor.handle_fetch(HttpRequest::get(AUDIO)).await.unwrap();
    let cached = second.response().unwrap();
    assert_eq!(cached.body.as_ref(), b"quote");
    assert_eq!(cached.content_type(), Some("audio/mpeg"));

    let cache = storage.open(interceptor.cache_name()).await.unwrap();
    assert_eq!(cache.keys().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_entries_stored_by_other_writers_are_served() {
    let storage = Arc::new(MemoryCacheStorage::new());
    let cache = storage.open(&config().cache_name).await.unwrap();
    cache
        .put(&HttpRequest::get(AUDIO), HttpResponse::new(200, &b"preloaded"[..]))
        .await
        .unwrap();

    let interceptor = interceptor(storage, Arc::new(MockHttp::new()), Arc::new(ImmediateScope));
    let result = interceptor.handle_fetch(HttpRequest::get(AUDIO)).await.unwrap();
    assert_eq!(result.response().unwrap().body.as_ref(), b"preloaded");
}

#[tokio::test]
async fn test_non_200_is_returned_but_never_cached() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .times(2)
        .returning(|_| Ok(HttpResponse::new(404, &b"missing"[..])));

    let storage = Arc::new(MemoryCacheStorage::new());
    let interceptor = interceptor(storage.clone(), Arc::new(http), Arc::new(ImmediateScope));

    for _ in 0..2 {
        let result = interceptor.handle_fetch(HttpRequest::get(AUDIO)).await.unwrap();
        assert_eq!(result.response().unwrap().status, 404);
    }

    let cache = storage.open(interceptor.cache_name()).await.unwrap();
    assert!(cache.keys().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_cache_write_still_returns_response() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| Ok(HttpResponse::new(200, vec![1u8; 1024])));

    let storage = Arc::new(MemoryCacheStorage::with_quota(16));
    let interceptor = interceptor(storage, Arc::new(http), Arc::new(ImmediateScope));

    let result = interceptor.handle_fetch(HttpRequest::get(AUDIO)).await.unwrap();
    assert_eq!(result.response().unwrap().body.len(), 1024);
}

#[tokio::test]
async fn test_unavailable_cache_falls_back_to_network() {
    let mut storage = MockStorage::new();
    storage
        .expect_open()
        .returning(|_| Err(BridgeError::Storage("disk gone".into())));

    let mut http = MockHttp::new();
    http.expect_execute()
        .times(1)
        .returning(|_| Ok(HttpResponse::new(200, &b"live"[..])));

    let interceptor = interceptor(Arc::new(storage), Arc::new(http), Arc::new(ImmediateScope));
    let result = interceptor.handle_fetch(HttpRequest::get(AUDIO)).await.unwrap();
    assert_eq!(result.response().unwrap().body.as_ref(), b"live");
}

#[tokio::test]
async fn test_network_failure_on_miss_is_an_error() {
    let mut http = MockHttp::new();
    http.expect_execute()
        .returning(|_| Err(BridgeError::Network("offline".into())));

    let interceptor = interceptor(
        Arc::new(MemoryCacheStorage::new()),
        Arc::new(http),
        Arc::new(ImmediateScope),
    );

    let err = interceptor
        .handle_fetch(HttpRequest::get(AUDIO))
        .await
        .unwrap_err();
    assert!(matches!(err, InterceptorError::Network(_)));
}

#[tokio::test]
async fn test_install_then_activate_deletes_stale_generations() {
    let storage = Arc::new(MemoryCacheStorage::new());
    for name in ["media-preload-v0", "thumbnails", "media-preload-v1"] {
        storage.open(name).await.unwrap();
    }

    let mut scope = MockScope::new();
    scope.expect_skip_waiting().times(1).returning(|| Ok(()));
    scope.expect_claim_clients().times(1).returning(|| Ok(()));

    let interceptor = interceptor(storage.clone(), Arc::new(MockHttp::new()), Arc::new(scope));
    assert_eq!(interceptor.state(), LifecycleState::Parsed);

    interceptor.install().await.unwrap();
    assert_eq!(interceptor.state(), LifecycleState::Installed);

    let mut report = interceptor.activate().await.unwrap();
    report.deleted.sort();
    assert_eq!(report.deleted, vec!["media-preload-v0", "thumbnails"]);
    assert_eq!(interceptor.state(), LifecycleState::Activated);

    assert_eq!(storage.keys().await.unwrap(), vec!["media-preload-v1".to_string()]);
}

#[tokio::test]
async fn test_activation_with_only_current_cache_deletes_nothing() {
    let storage = Arc::new(MemoryCacheStorage::new());
    storage.open(&config().cache_name).await.unwrap();

    let interceptor = interceptor(storage.clone(), Arc::new(MockHttp::new()), Arc::new(ImmediateScope));
    let report = interceptor.activate().await.unwrap();

    assert!(report.deleted.is_empty());
    assert!(storage.has(&config().cache_name).await.unwrap());
}

#[tokio::test]
async fn test_failed_install_keeps_state() {
    let mut scope = MockScope::new();
    scope
        .expect_skip_waiting()
        .returning(|| Err(BridgeError::NotAvailable("no worker scope".into())));

    let interceptor = interceptor(
        Arc::new(MemoryCacheStorage::new()),
        Arc::new(MockHttp::new()),
        Arc::new(scope),
    );

    assert!(matches!(
        interceptor.install().await,
        Err(InterceptorError::Lifecycle(_))
    ));
    assert_eq!(interceptor.state(), LifecycleState::Parsed);
}

#[test]
fn test_invalid_origin_is_rejected() {
    let result = FetchInterceptor::new(
        InterceptorConfig::new("app.example.com"),
        Arc::new(MemoryCacheStorage::new()),
        Arc::new(MockHttp::new()),
        Arc::new(ImmediateScope),
    );
    assert!(matches!(result, Err(InterceptorError::Config(_))));
}
