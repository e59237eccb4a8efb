//! # Folder Mirroring Engine
//!
//! Mirrors one folder of a cloud file store onto local disk.
//!
//! ## Overview
//!
//! The pipeline runs in a fixed order:
//! - resolve a `/`-delimited path to a remote folder, creating segments on demand
//! - list the folder page by page, once for totals and once for the transfer
//! - download every listed file under a bounded worker pool
//! - fold byte and file deltas into cumulative progress snapshots
//! - optionally delete the remote folder after a complete transfer
//!
//! Every remote call goes through the shared admission limiter and the retry
//! policy.
//!
//! ## Components
//!
//! - **Retry Policy** (`retry`): Bounded re-attempts with NotFound/Transient/Fatal classification
//! - **Path Resolver** (`resolver`): Sequential folder lookup and creation
//! - **Folder Enumerator** (`enumerator`): Paginated listing and totals
//! - **Download Coordinator** (`coordinator`): Concurrent, fail-fast transfer
//! - **Progress** (`progress`): Delta aggregation and status records

pub mod coordinator;
pub mod enumerator;
pub mod error;
pub mod progress;
pub mod resolver;
pub mod retry;

pub use coordinator::{DownloadCoordinator, TransferStream};
pub use enumerator::{FileEntry, FolderEnumerator, FolderTotals};
pub use error::{ErrorKind, Result, StatusMessage, SyncError};
pub use progress::{
    format_file_size, CleanupOutcome, ProgressAggregator, ProgressDelta, ProgressUpdate,
    TransferProgress, TransferStatus,
};
pub use resolver::{FolderPath, FolderRef, PathResolver};
pub use retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
