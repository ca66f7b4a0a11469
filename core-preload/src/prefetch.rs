//! # Range Prefetcher
//!
//! Warms the first segment of a video by reading only its leading byte range.
//! The request is cancelled as soon as the threshold is reached, and it always
//! bypasses the HTTP cache so the partial body never lands in the persistent
//! media cache.

use crate::error::{PreloadError, Result};
use bridge_traits::{BridgeError, CacheMode, HttpClient, HttpRequest};
use core_runtime::logging::redact_url;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Result of a completed head read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadPrefetch {
    /// Bytes received before the read stopped.
    pub bytes: u64,
    /// `true` when the threshold was reached and the transfer was cancelled.
    pub cancelled: bool,
}

#[derive(Clone)]
pub struct RangePrefetcher {
    http: Arc<dyn HttpClient>,
    threshold: u64,
}

impl RangePrefetcher {
    pub fn new(http: Arc<dyn HttpClient>, threshold: u64) -> Self {
        Self { http, threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Read up to the threshold from the head of `url`.
    ///
    /// Servers that ignore `Range` and send the full file are still cut off
    /// at the threshold; the reported count may overshoot it by at most one
    /// chunk.
    ///
    /// # Errors
    ///
    /// Non-success status, a missing body and read failures are all errors.
    /// Reaching the threshold is not.
    #[instrument(skip(self), fields(url = %redact_url(url), threshold = self.threshold))]
    pub async fn prefetch_head(&self, url: &str) -> Result<HeadPrefetch> {
        let request = HttpRequest::get(url)
            .range(0, self.threshold.saturating_sub(1))
            .cache_mode(CacheMode::NoStore);
        let cancel = CancellationToken::new();

        let response = self
            .http
            .execute_streaming(request, cancel.clone())
            .await
            .map_err(PreloadError::from_network)?;

        if !response.is_success() {
            cancel.cancel();
            return Err(PreloadError::HttpStatus(response.status));
        }

        let Some(mut body) = response.body else {
            cancel.cancel();
            return Err(PreloadError::MissingBody);
        };

        let mut received: u64 = 0;
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    received += bytes.len() as u64;
                    if received >= self.threshold {
                        cancel.cancel();
                        debug!(received, "Head threshold reached, request cancelled");
                        return Ok(HeadPrefetch {
                            bytes: received,
                            cancelled: true,
                        });
                    }
                }
                Err(BridgeError::Aborted) => break,
                Err(e) => {
                    cancel.cancel();
                    return Err(PreloadError::StreamRead(e.to_string()));
                }
            }
        }

        debug!(received, "Head read completed before threshold");
        Ok(HeadPrefetch {
            bytes: received,
            cancelled: false,
        })
    }
}
