//! # Media Fetch Interceptor
//!
//! Cache-first handling of same-origin media requests (`/videos/`, `/audio/`
//! by default) over the named cache the preloader fills. GET requests only;
//! range requests and everything else are bypassed.

pub mod error;
pub mod interceptor;
pub mod route;

pub use error::{InterceptorError, Result};
pub use interceptor::{ActivationReport, FetchInterceptor, Interception, LifecycleState};
pub use route::{BypassReason, MediaRoutes};
