use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Cache name mismatch: preloader uses '{preload}', interceptor uses '{interceptor}'")]
    CacheNameMismatch { preload: String, interceptor: String },

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::Error),

    #[error("Preload error: {0}")]
    Preload(#[from] core_preload::PreloadError),

    #[error("Interceptor error: {0}")]
    Interceptor(#[from] core_interceptor::InterceptorError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
