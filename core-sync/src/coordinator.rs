//! # Download Coordinator
//!
//! Mirrors the files of one remote folder into a local directory.
//!
//! ## Workflow
//!
//! 1. Create the destination directory
//! 2. Count files and bytes with a totals-only listing; emit the baseline
//! 3. List the folder again and download every entry, at most
//!    `concurrency` at a time
//! 4. Fold byte and file deltas into snapshots as they arrive
//! 5. Optionally delete the remote folder once every file succeeded
//!
//! The first failing file fails the whole transfer. Files already written
//! stay on disk.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use futures::StreamExt;
//!
//! let mut transfer = coordinator.download_all(folder, "./out", 4, false);
//! while let Some(status) = transfer.next().await {
//!     println!("{}", status.status_message().default_message);
//! }
//! ```
//!
//! Dropping the returned [`TransferStream`] cancels the transfer: nothing new
//! is scheduled and in-flight downloads are abandoned.

use bridge_traits::storage::{FileSystemAccess, RemoteStorage};
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

use crate::enumerator::{FileEntry, FolderEnumerator};
use crate::error::{Result, SyncError};
use crate::progress::{CleanupOutcome, ProgressAggregator, ProgressDelta, TransferStatus};
use crate::resolver::FolderRef;
use crate::retry::RetryPolicy;

/// Read buffer per download
const CHUNK_SIZE: usize = 64 * 1024;

/// Status records buffered ahead of a slow consumer
const STATUS_BUFFER: usize = 64;

/// Downloads an enumerated folder under bounded concurrency
#[derive(Clone)]
pub struct DownloadCoordinator {
    storage: Arc<dyn RemoteStorage>,
    file_system: Arc<dyn FileSystemAccess>,
    enumerator: FolderEnumerator,
    retry: RetryPolicy,
}

impl DownloadCoordinator {
    pub fn new(
        storage: Arc<dyn RemoteStorage>,
        file_system: Arc<dyn FileSystemAccess>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            enumerator: FolderEnumerator::new(Arc::clone(&storage), retry.clone()),
            storage,
            file_system,
            retry,
        }
    }

    /// Start mirroring `folder` into `destination`
    ///
    /// Must be called from within a Tokio runtime. The transfer runs in a
    /// background task and reports through the returned stream. A
    /// `concurrency` of zero is treated as one.
    pub fn download_all(
        &self,
        folder: FolderRef,
        destination: impl Into<PathBuf>,
        concurrency: usize,
        delete_after: bool,
    ) -> TransferStream {
        let transfer_id = Uuid::new_v4();
        let (status_tx, status_rx) = mpsc::channel(STATUS_BUFFER);
        let cancel = CancellationToken::new();

        let span = info_span!(
            "transfer",
            transfer_id = %transfer_id,
            folder_id = %folder.id,
            concurrency
        );

        let run = TransferRun {
            coordinator: self.clone(),
            folder,
            destination: destination.into(),
            concurrency: concurrency.max(1),
            delete_after,
            status_tx,
        };

        tokio::spawn(run.execute(cancel.clone()).instrument(span));

        TransferStream {
            transfer_id,
            receiver: status_rx,
            _cancel_on_drop: cancel.drop_guard(),
        }
    }
}

/// Status stream of one transfer
///
/// Ends after the terminal record. Dropping it cancels the transfer.
pub struct TransferStream {
    transfer_id: Uuid,
    receiver: mpsc::Receiver<TransferStatus>,
    _cancel_on_drop: DropGuard,
}

impl TransferStream {
    pub fn transfer_id(&self) -> Uuid {
        self.transfer_id
    }

    /// Stop the transfer; equivalent to dropping the stream
    pub fn cancel(self) {}
}

impl std::fmt::Debug for TransferStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferStream")
            .field("transfer_id", &self.transfer_id)
            .finish_non_exhaustive()
    }
}

impl Stream for TransferStream {
    type Item = TransferStatus;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

struct TransferRun {
    coordinator: DownloadCoordinator,
    folder: FolderRef,
    destination: PathBuf,
    concurrency: usize,
    delete_after: bool,
    status_tx: mpsc::Sender<TransferStatus>,
}

impl TransferRun {
    async fn execute(self, cancel: CancellationToken) {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            result = self.run() => result,
        };

        match outcome {
            Ok(cleanup) => {
                info!(?cleanup, "Transfer completed");
                let _ = self
                    .status_tx
                    .send(TransferStatus::Completed { cleanup })
                    .await;
            }
            Err(SyncError::Cancelled) => {
                debug!("Transfer cancelled by consumer");
            }
            Err(error) => {
                error!(error = %error, "Transfer failed");
                let _ = self.status_tx.send(TransferStatus::Failed(error)).await;
            }
        }
    }

    async fn emit(&self, status: TransferStatus) -> Result<()> {
        self.status_tx
            .send(status)
            .await
            .map_err(|_| SyncError::Cancelled)
    }

    async fn run(&self) -> Result<CleanupOutcome> {
        let coordinator = &self.coordinator;

        debug!(destination = %self.destination.display(), "Creating destination directory");
        coordinator
            .file_system
            .create_dir_all(&self.destination)
            .await
            .map_err(|e| {
                SyncError::fatal(
                    &format!("Failed to create {}", self.destination.display()),
                    e,
                )
            })?;

        let totals = coordinator.enumerator.totals(&self.folder).await?;
        info!(files = totals.files, bytes = totals.bytes, "Folder totals computed");

        let mut aggregator = ProgressAggregator::new(totals);
        self.emit(TransferStatus::Progress(aggregator.current().into()))
            .await?;

        self.download_entries(&mut aggregator).await?;

        if let Some(settled) = aggregator.settle() {
            debug!("Listed sizes differed from received bytes, settling progress");
            self.emit(TransferStatus::Progress(settled.into())).await?;
        }

        Ok(self.cleanup().await)
    }

    /// Schedule one task per listed entry and fold their deltas until all
    /// of them finished or one failed
    async fn download_entries(&self, aggregator: &mut ProgressAggregator) -> Result<()> {
        let coordinator = &self.coordinator;
        let slots = Arc::new(Semaphore::new(self.concurrency));
        let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<ProgressDelta>();
        let mut delta_tx = Some(delta_tx);
        let mut entries = coordinator.enumerator.entries(&self.folder);
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        // Finished tasks and free slots come before deltas: a streaming
        // download keeps the delta channel ready on every pass
        loop {
            tokio::select! {
                biased;

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    match joined {
                        Ok(Ok(())) => {}
                        Ok(Err(error)) => return Err(error),
                        Err(join_error) => {
                            return Err(SyncError::fatal("Download task aborted", join_error));
                        }
                    }
                }

                permit = Arc::clone(&slots).acquire_owned(), if delta_tx.is_some() => {
                    let permit = permit
                        .map_err(|e| SyncError::fatal("Download slots closed", e))?;

                    match entries.next().await {
                        Some(Ok(entry)) => {
                            if let Some(deltas) = &delta_tx {
                                let task = FileDownload {
                                    storage: Arc::clone(&coordinator.storage),
                                    file_system: Arc::clone(&coordinator.file_system),
                                    retry: coordinator.retry.clone(),
                                    target: self.destination.join(local_file_name(&entry.name)),
                                    entry,
                                    deltas: deltas.clone(),
                                };
                                tasks.spawn(task.run(permit).in_current_span());
                            }
                        }
                        Some(Err(error)) => return Err(error),
                        None => {
                            debug!(scheduled = tasks.len(), "Listing exhausted");
                            // Last sender now lives in the tasks; the channel closes with them
                            delta_tx = None;
                        }
                    }
                }

                Some(delta) = delta_rx.recv() => {
                    let snapshot = aggregator.apply(delta);
                    self.emit(TransferStatus::Progress(snapshot.into())).await?;
                }

                else => break,
            }
        }

        Ok(())
    }

    async fn cleanup(&self) -> CleanupOutcome {
        if !self.delete_after {
            return CleanupOutcome::NotRequested;
        }

        let coordinator = &self.coordinator;
        let storage = coordinator.storage.as_ref();
        let id = self.folder.id.as_str();

        match coordinator
            .retry
            .run(id, move || storage.delete_by_id(id))
            .await
        {
            Ok(()) => {
                info!(folder_id = id, "Deleted remote folder");
                CleanupOutcome::Deleted
            }
            Err(error) => {
                warn!(folder_id = id, error = %error, "Failed to delete remote folder");
                CleanupOutcome::Failed(error.status_message())
            }
        }
    }
}

/// One file copy from remote to local
struct FileDownload {
    storage: Arc<dyn RemoteStorage>,
    file_system: Arc<dyn FileSystemAccess>,
    retry: RetryPolicy,
    entry: FileEntry,
    target: PathBuf,
    deltas: mpsc::UnboundedSender<ProgressDelta>,
}

impl FileDownload {
    #[instrument(skip(self, _slot), fields(file = %self.entry.name, file_id = %self.entry.id))]
    async fn run(self, _slot: OwnedSemaphorePermit) -> Result<()> {
        let storage = self.storage.as_ref();
        let id = self.entry.id.as_str();
        let mut reader = self
            .retry
            .run(&self.entry.name, move || storage.download_by_id(id))
            .await?;

        let mut writer = self
            .file_system
            .open_write_stream(&self.target)
            .await
            .map_err(|e| local_failure("open", &self.target, e))?;

        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut written: u64 = 0;

        loop {
            let read = reader.read(&mut buffer).await.map_err(|e| SyncError::Transient {
                attempts: 1,
                message: format!("{}: download interrupted: {}", self.entry.name, e),
            })?;

            if read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..read])
                .await
                .map_err(|e| local_failure("write", &self.target, e))?;

            written += read as u64;
            // Receiver only disappears when the transfer is already over
            let _ = self.deltas.send(ProgressDelta::bytes_received(read as u64));
        }

        writer
            .shutdown()
            .await
            .map_err(|e| local_failure("close", &self.target, e))?;

        debug!(bytes = written, "File downloaded");
        let _ = self.deltas.send(ProgressDelta::file_completed());

        Ok(())
    }
}

fn local_failure(action: &str, path: &Path, error: impl std::fmt::Display) -> SyncError {
    SyncError::fatal(&format!("Failed to {} {}", action, path.display()), error)
}

/// Map a remote file name onto a single local path component
fn local_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c == '/' || c == '\\' || c == '\0' { '_' } else { c })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => format!("_{}", cleaned),
        _ => cleaned,
    }
}
