use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage quota exceeded")]
    QuotaExceeded,

    #[error("Request aborted")]
    Aborted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` when the failure came from the persistent store rather
    /// than the network.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            BridgeError::Storage(_) | BridgeError::QuotaExceeded | BridgeError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
