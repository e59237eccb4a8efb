use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure taxonomy for mirror operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// A folder or file does not exist; never retried
    #[error("Path not found: '{path}': {reason}")]
    NotFound { path: String, reason: String },

    /// Network, quota or server failure that outlived the attempt budget
    #[error("Remote call failed after {attempts} attempt(s): {message}")]
    Transient { attempts: u32, message: String },

    /// Local filesystem failure, malformed response or missing capability
    #[error("{0}")]
    Fatal(String),

    /// The consumer stopped listening before the transfer finished
    #[error("Transfer cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Coarse classification of a [`SyncError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Transient,
    Fatal,
    Cancelled,
}

/// User-facing message with a localization key
///
/// `default_message` is English; presentation layers look up
/// `message_key` and interpolate `message_args` instead when they can.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub default_message: String,
    pub message_key: String,
    pub message_args: BTreeMap<String, Value>,
}

impl StatusMessage {
    pub fn new(default_message: impl Into<String>, message_key: impl Into<String>) -> Self {
        Self {
            default_message: default_message.into(),
            message_key: message_key.into(),
            message_args: BTreeMap::new(),
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.message_args.insert(name.into(), value.into());
        self
    }
}

impl SyncError {
    pub fn not_found(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SyncError::NotFound {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn fatal(context: &str, error: impl std::fmt::Display) -> Self {
        SyncError::Fatal(format!("{}: {}", context, error))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::NotFound { .. } => ErrorKind::NotFound,
            SyncError::Transient { .. } => ErrorKind::Transient,
            SyncError::Fatal(_) => ErrorKind::Fatal,
            SyncError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Re-attach a lookup failure to the full path the caller asked for
    pub fn with_path(self, path: &str) -> Self {
        match self {
            SyncError::NotFound { reason, .. } => SyncError::NotFound {
                path: path.to_string(),
                reason,
            },
            other => other,
        }
    }

    pub fn status_message(&self) -> StatusMessage {
        match self {
            SyncError::NotFound { path, .. } => StatusMessage::new(
                format!("Path not found: '{}'", path),
                "tasks.drive.path_not_found",
            )
            .with_arg("path", path.as_str()),
            SyncError::Transient { attempts, message } => StatusMessage::new(
                format!(
                    "Google Drive did not respond after {} attempt(s): {}",
                    attempts, message
                ),
                "tasks.drive.transient_failure",
            )
            .with_arg("attempts", *attempts)
            .with_arg("message", message.as_str()),
            SyncError::Fatal(message) => StatusMessage::new(
                format!("Download failed: {}", message),
                "tasks.drive.failed",
            )
            .with_arg("message", message.as_str()),
            SyncError::Cancelled => {
                StatusMessage::new("Download cancelled", "tasks.drive.cancelled")
            }
        }
    }
}
