//! Request routing: which requests are answered cache-first.

use bridge_traits::{HttpMethod, HttpRequest};
use serde::Serialize;
use std::fmt;
use url::Url;

/// Why a request was left to the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BypassReason {
    NonGet,
    /// Range requests go straight to the network so partial bodies never
    /// meet the cache.
    RangeRequest,
    InvalidUrl,
    CrossOrigin,
    NotMedia,
}

impl fmt::Display for BypassReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BypassReason::NonGet => "non-GET request",
            BypassReason::RangeRequest => "range request",
            BypassReason::InvalidUrl => "unparsable URL",
            BypassReason::CrossOrigin => "cross-origin request",
            BypassReason::NotMedia => "path outside media prefixes",
        };
        f.write_str(text)
    }
}

/// Same-origin media routes.
#[derive(Debug, Clone)]
pub struct MediaRoutes {
    origin: Url,
    prefixes: Vec<String>,
}

impl MediaRoutes {
    pub fn new(origin: Url, prefixes: Vec<String>) -> Self {
        Self { origin, prefixes }
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// `None` when the request should be served cache-first.
    pub fn bypass_reason(&self, request: &HttpRequest) -> Option<BypassReason> {
        if request.method != HttpMethod::Get {
            return Some(BypassReason::NonGet);
        }
        if request.has_header("range") {
            return Some(BypassReason::RangeRequest);
        }

        let Ok(url) = Url::parse(&request.url) else {
            return Some(BypassReason::InvalidUrl);
        };
        if url.origin() != self.origin.origin() {
            return Some(BypassReason::CrossOrigin);
        }
        if !self
            .prefixes
            .iter()
            .any(|prefix| url.path().starts_with(prefix.as_str()))
        {
            return Some(BypassReason::NotMedia);
        }

        None
    }
}
