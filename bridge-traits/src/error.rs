use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("HTTP status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Whether the failure means the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BridgeError::NotFound(_))
            || matches!(self, BridgeError::HttpStatus { status: 404, .. })
    }

    /// Whether re-issuing the same call could plausibly succeed.
    ///
    /// Malformed responses and missing capabilities are never retried.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            BridgeError::NotFound(_)
                | BridgeError::InvalidResponse(_)
                | BridgeError::NotAvailable(_)
        ) && !self.is_not_found()
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
