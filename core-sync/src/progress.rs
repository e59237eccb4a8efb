//! # Transfer Progress
//!
//! Folds the delta stream produced by download tasks into cumulative
//! snapshots, and defines the status records handed to the observer.

use serde::{Deserialize, Serialize};

use crate::enumerator::FolderTotals;
use crate::error::{StatusMessage, SyncError};

/// Change reported by a download task
///
/// Negative values mean work finished; the aggregator applies them in
/// arrival order, exactly once each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDelta {
    pub bytes: i64,
    pub files: i64,
}

impl ProgressDelta {
    /// `bytes` more bytes were written locally
    pub fn bytes_received(bytes: u64) -> Self {
        Self {
            bytes: -i64::try_from(bytes).unwrap_or(i64::MAX),
            files: 0,
        }
    }

    /// One file was written completely
    pub fn file_completed() -> Self {
        Self { bytes: 0, files: -1 }
    }
}

/// Work still outstanding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferProgress {
    pub bytes_remaining: u64,
    pub files_remaining: u64,
}

impl From<FolderTotals> for TransferProgress {
    fn from(totals: FolderTotals) -> Self {
        Self {
            bytes_remaining: totals.bytes,
            files_remaining: totals.files,
        }
    }
}

impl TransferProgress {
    pub fn is_settled(&self) -> bool {
        self.bytes_remaining == 0 && self.files_remaining == 0
    }

    /// Human-readable summary, e.g. `Downloading - 2 files / 300 B left`
    pub fn message(&self) -> StatusMessage {
        let noun = if self.files_remaining == 1 { "file" } else { "files" };
        StatusMessage::new(
            format!(
                "Downloading - {} {} / {} left",
                self.files_remaining,
                noun,
                format_file_size(self.bytes_remaining)
            ),
            "tasks.drive.download.running",
        )
        .with_arg("bytes", self.bytes_remaining)
        .with_arg("files", self.files_remaining)
    }
}

/// Running fold over the delta stream
///
/// Owns the only mutable copy of the transfer state. Counters saturate at
/// zero, so a file that turns out larger than listed cannot underflow them.
#[derive(Debug)]
pub struct ProgressAggregator {
    state: TransferProgress,
}

impl ProgressAggregator {
    pub fn new(baseline: FolderTotals) -> Self {
        Self {
            state: baseline.into(),
        }
    }

    pub fn current(&self) -> TransferProgress {
        self.state
    }

    /// Apply one delta and return the new snapshot
    pub fn apply(&mut self, delta: ProgressDelta) -> TransferProgress {
        self.state.bytes_remaining = offset(self.state.bytes_remaining, delta.bytes);
        self.state.files_remaining = offset(self.state.files_remaining, delta.files);
        self.state
    }

    /// Force the counters to zero once every file succeeded
    ///
    /// Returns the settled snapshot when this changed anything, which only
    /// happens if the listed sizes disagreed with the bytes received.
    pub fn settle(&mut self) -> Option<TransferProgress> {
        if self.state.is_settled() {
            None
        } else {
            self.state = TransferProgress::default();
            Some(self.state)
        }
    }
}

fn offset(value: u64, delta: i64) -> u64 {
    if delta < 0 {
        value.saturating_sub(delta.unsigned_abs())
    } else {
        value.saturating_add(delta.unsigned_abs())
    }
}

/// Render a byte count with binary units
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    const TB: u64 = GB * 1024;

    if bytes >= TB {
        format!("{:.2} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Progress snapshot plus its user-facing message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    #[serde(flatten)]
    pub progress: TransferProgress,
    pub message: StatusMessage,
}

impl From<TransferProgress> for ProgressUpdate {
    fn from(progress: TransferProgress) -> Self {
        Self {
            message: progress.message(),
            progress,
        }
    }
}

/// What happened to the remote folder after a successful transfer
#[derive(Debug, Clone, PartialEq)]
pub enum CleanupOutcome {
    NotRequested,
    Deleted,
    /// Deletion failed; the local copy is complete regardless
    Failed(StatusMessage),
}

/// One record of a transfer's status stream
///
/// Zero or more `Progress` records are followed by exactly one terminal
/// record, unless the consumer stops listening first.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferStatus {
    Progress(ProgressUpdate),
    Completed { cleanup: CleanupOutcome },
    Failed(SyncError),
}

impl TransferStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransferStatus::Progress(_))
    }

    pub fn progress(&self) -> Option<TransferProgress> {
        match self {
            TransferStatus::Progress(update) => Some(update.progress),
            _ => None,
        }
    }

    pub fn status_message(&self) -> StatusMessage {
        match self {
            TransferStatus::Progress(update) => update.message.clone(),
            TransferStatus::Completed { .. } => {
                StatusMessage::new("Download completed", "tasks.drive.download.completed")
            }
            TransferStatus::Failed(error) => error.status_message(),
        }
    }
}
