//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{
        ByteStream, CacheMode, HttpClient, HttpMethod, HttpRequest, HttpResponse,
        StreamingResponse,
    },
};
use futures_util::{StreamExt, TryStreamExt};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Reqwest-based HTTP client implementation
///
/// Provides HTTP operations with:
/// - Connection pooling via reqwest
/// - TLS support by default
/// - Streaming bodies that stop as soon as the caller's token is cancelled
///
/// No overall request timeout is applied: media bodies can legitimately take
/// minutes. Only connection establishment is bounded.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    /// Create a new HTTP client with a custom connect timeout
    pub fn with_connect_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .pool_max_idle_per_host(10)
            .user_agent(concat!("media-preload-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if request.cache_mode == CacheMode::NoStore {
            req = req.header(reqwest::header::CACHE_CONTROL, "no-store");
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn collect_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect()
    }

    fn map_error(e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Network("Request timed out".to_string())
        } else if e.is_connect() {
            BridgeError::Network(format!("Connection failed: {}", e))
        } else {
            BridgeError::Network(e.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "Executing HTTP request");

        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "HTTP request failed");
                Self::map_error(e)
            })?;

        let status = response.status().as_u16();
        let headers = Self::collect_headers(response.headers());
        let body = response.bytes().await.map_err(Self::map_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    async fn execute_streaming(
        &self,
        request: HttpRequest,
        cancel: CancellationToken,
    ) -> Result<StreamingResponse> {
        debug!(method = %request.method, url = %request.url, "Opening HTTP stream");

        let is_head = request.method == HttpMethod::Head;
        let send = self.build_request(request).send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(BridgeError::Aborted),
            result = send => result.map_err(Self::map_error)?,
        };

        let status = response.status().as_u16();
        let headers = Self::collect_headers(response.headers());

        if is_head || status == 204 {
            return Ok(StreamingResponse {
                status,
                headers,
                body: None,
            });
        }

        // Dropping the stream drops the response, which closes the connection.
        let body: ByteStream = Box::pin(
            response
                .bytes_stream()
                .map_err(Self::map_error)
                .take_until(cancel.cancelled_owned()),
        );

        Ok(StreamingResponse {
            status,
            headers,
            body: Some(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_client_creation() {
        assert!(ReqwestHttpClient::new().is_ok());
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Head),
            reqwest::Method::HEAD
        );
    }

    #[tokio::test]
    async fn test_streaming_aborts_when_already_cancelled() {
        let client = ReqwestHttpClient::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = client
            .execute_streaming(HttpRequest::get("http://127.0.0.1:9/videos/a.mp4"), cancel)
            .await;

        assert!(matches!(result, Err(BridgeError::Aborted)));
    }
}
