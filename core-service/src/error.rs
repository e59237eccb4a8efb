use core_sync::{StatusMessage, SyncError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),
}

impl ServiceError {
    /// Localizable message for the presentation layer
    pub fn status_message(&self) -> StatusMessage {
        match self {
            ServiceError::Sync(error) => error.status_message(),
            ServiceError::Runtime(error) => {
                SyncError::Fatal(error.to_string()).status_message()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
