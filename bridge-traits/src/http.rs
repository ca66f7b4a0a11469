//! HTTP Client Abstraction
//!
//! Provides buffered and streaming fetch operations. Streaming requests carry a
//! cancellation token so callers can abort a transfer mid-body.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream};
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the transport may use its own HTTP cache for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Default,
    /// Bypass any transport-level cache in both directions.
    NoStore,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
    pub cache_mode: CacheMode,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
            cache_mode: CacheMode::Default,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Request the inclusive byte range `start..=end`.
    pub fn range(self, start: u64, end: u64) -> Self {
        self.header("Range", format!("bytes={}-{}", start, end))
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    pub fn cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header_value(name).is_some()
    }
}

/// Fully buffered HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response carries a partial body (206)
    pub fn is_partial(&self) -> bool {
        self.status == 206
    }

    /// Check if response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Body of a streaming response, yielded chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Response whose body is consumed incrementally.
pub struct StreamingResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    /// `None` when the transport has no readable body (e.g. HEAD, 204).
    pub body: Option<ByteStream>,
}

impl StreamingResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "ByteStream { ... }"))
            .finish()
    }
}

/// Async HTTP client trait
///
/// Abstracts fetch so the preloader and the interceptor run unchanged against
/// reqwest on desktop, the browser `fetch` API, or an in-process fake.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpClient, HttpRequest};
///
/// async fn fetch_audio(client: &dyn HttpClient) -> Result<Bytes> {
///     let response = client.execute(HttpRequest::get("https://cdn.example.com/audio/1.mp3")).await?;
///     Ok(response.body)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Execute a request and buffer the whole body.
    ///
    /// # Errors
    ///
    /// Returns error if the connection fails or the request times out. HTTP
    /// error statuses are returned as responses, not errors.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Execute a request and hand back the body as a stream.
    ///
    /// Cancelling `cancel` must abort the underlying transfer; the stream then
    /// ends. The default implementation buffers through [`execute`] and
    /// yields the body as a single chunk.
    ///
    /// [`execute`]: HttpClient::execute
    async fn execute_streaming(
        &self,
        request: HttpRequest,
        cancel: CancellationToken,
    ) -> Result<StreamingResponse> {
        if cancel.is_cancelled() {
            return Err(crate::error::BridgeError::Aborted);
        }
        let response = self.execute(request).await?;
        let body: ByteStream = Box::pin(stream::once(async move { Ok(response.body) }));
        Ok(StreamingResponse {
            status: response.status,
            headers: response.headers,
            body: Some(body),
        })
    }
}
