//! Shared fakes for preload integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::{ByteStream, HttpClient, HttpRequest, HttpResponse, StreamingResponse};
use bytes::Bytes;
use futures::stream;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const MIB: usize = 1024 * 1024;

/// Canned answer for one URL.
#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Bytes,
    pub content_type: Option<String>,
    pub chunk_size: usize,
    pub fail_after_chunks: Option<usize>,
}

impl Route {
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: None,
            chunk_size: 64 * 1024,
            fail_after_chunks: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok(Bytes::new())
        }
    }

    pub fn audio(body: &'static [u8]) -> Self {
        Self::ok(Bytes::from_static(body)).with_content_type("audio/mpeg")
    }

    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    pub fn chunked(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn failing_after(mut self, chunks: usize) -> Self {
        self.fail_after_chunks = Some(chunks);
        self
    }
}

/// In-process HTTP client with call accounting.
#[derive(Default)]
pub struct FakeHttp {
    routes: Mutex<HashMap<String, Route>>,
    latency: Mutex<Duration>,
    requests: Mutex<Vec<HttpRequest>>,
    tokens: Mutex<Vec<CancellationToken>>,
    execute_calls: AtomicUsize,
    streaming_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, route: Route) -> Self {
        self.set_route(url, route);
        self
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.lock() = latency;
        self
    }

    pub fn set_route(&self, url: &str, route: Route) {
        self.routes.lock().insert(url.to_string(), route);
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn streaming_calls(&self) -> usize {
        self.streaming_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.url == url).count()
    }

    pub fn tokens(&self) -> Vec<CancellationToken> {
        self.tokens.lock().clone()
    }

    fn lookup(&self, request: &HttpRequest) -> Result<Route> {
        self.requests.lock().push(request.clone());
        self.routes
            .lock()
            .get(&request.url)
            .cloned()
            .ok_or_else(|| BridgeError::Network(format!("no route for {}", request.url)))
    }

    async fn simulate_latency(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.execute_calls.fetch_add(1, Ordering::SeqCst);
        let route = self.lookup(&request);
        self.simulate_latency().await;
        let route = route?;

        let mut response = HttpResponse::new(route.status, route.body);
        if let Some(content_type) = route.content_type {
            response = response.with_header("Content-Type", content_type);
        }
        Ok(response)
    }

    async fn execute_streaming(
        &self,
        request: HttpRequest,
        cancel: CancellationToken,
    ) -> Result<StreamingResponse> {
        self.streaming_calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().push(cancel);
        let route = self.lookup(&request);
        self.simulate_latency().await;
        let route = route?;

        let mut chunks: Vec<Result<Bytes>> = route
            .body
            .chunks(route.chunk_size.max(1))
            .map(Bytes::copy_from_slice)
            .map(Ok)
            .collect();
        if let Some(limit) = route.fail_after_chunks {
            chunks.truncate(limit);
            chunks.push(Err(BridgeError::Network("connection reset".to_string())));
        }

        let body: ByteStream = Box::pin(stream::iter(chunks));
        Ok(StreamingResponse {
            status: route.status,
            headers: HashMap::new(),
            body: Some(body),
        })
    }
}
