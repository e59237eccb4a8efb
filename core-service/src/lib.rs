//! Mirror service facade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, filesystem,
//! credentials, admission limiter) into the mirror engine and exposes the
//! caller-facing entry points, which take `/`-delimited folder paths.
//! Desktop apps typically enable the `desktop-shims` feature (which depends
//! on `bridge-desktop`) to get default HTTP and filesystem bridges.
//!
//! ```ignore
//! use core_service::MirrorService;
//! use futures::StreamExt;
//!
//! let service = MirrorService::new(config)?;
//! let options = service.default_download_options().with_delete_after(true);
//! let mut transfer = service.download_folder("project/2024", "./out", options).await?;
//! while let Some(status) = transfer.next().await {
//!     println!("{}", status.status_message().default_message);
//! }
//! ```

pub mod error;

pub use error::{Result, ServiceError};

pub use core_runtime::config::{DownloadOptions, MirrorConfig, MirrorConfigBuilder};
pub use core_sync::{
    CleanupOutcome, ErrorKind, FolderRef, ProgressUpdate, StatusMessage, SyncError,
    TransferProgress, TransferStatus, TransferStream,
};

use std::path::PathBuf;
use std::sync::Arc;

use bridge_traits::storage::RemoteStorage;
use core_sync::{DownloadCoordinator, FolderPath, PathResolver, RetryPolicy};
use provider_google_drive::GoogleDriveConnector;
use tracing::{debug, info, instrument};

#[cfg(feature = "desktop-shims")]
use bridge_traits::auth::AccessTokenProvider;

/// Primary facade exposed to host applications.
#[derive(Clone)]
pub struct MirrorService {
    config: MirrorConfig,
    storage: Arc<dyn RemoteStorage>,
    retry: RetryPolicy,
    resolver: Arc<PathResolver>,
    coordinator: DownloadCoordinator,
}

impl MirrorService {
    /// Create a service talking to Google Drive through the configured bridges.
    pub fn new(config: MirrorConfig) -> Result<Self> {
        let connector = GoogleDriveConnector::new(
            Arc::clone(&config.http_client),
            Arc::clone(&config.token_provider),
        )
        .with_request_timeout(config.request_timeout);

        Self::with_storage(config, Arc::new(connector))
    }

    /// Create a service on top of any remote store implementation.
    pub fn with_storage(config: MirrorConfig, storage: Arc<dyn RemoteStorage>) -> Result<Self> {
        config.validate()?;

        let retry = RetryPolicy::new(
            Arc::clone(&config.admission_limiter),
            config.max_attempts,
        );
        let resolver = PathResolver::new(Arc::clone(&storage), retry.clone());
        let coordinator = DownloadCoordinator::new(
            Arc::clone(&storage),
            Arc::clone(&config.file_system),
            retry.clone(),
        );

        Ok(Self {
            config,
            storage,
            retry,
            resolver: Arc::new(resolver),
            coordinator,
        })
    }

    /// Access the configuration the service was built from.
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    pub fn default_download_options(&self) -> DownloadOptions {
        self.config.download_options()
    }

    /// Resolve a `/`-delimited path to a remote folder
    ///
    /// With `create` set, missing segments are created on the way down.
    #[instrument(skip(self))]
    pub async fn folder_by_path(&self, path: &str, create: bool) -> Result<FolderRef> {
        let path = FolderPath::parse(path)?;
        Ok(self.resolver.resolve(&path, create).await?)
    }

    /// Mirror the files directly inside `path` into `destination`
    ///
    /// The path is resolved once, before the transfer starts; a missing
    /// folder is reported here rather than through the stream. Subfolders
    /// are ignored.
    #[instrument(skip(self, destination, options))]
    pub async fn download_folder(
        &self,
        path: &str,
        destination: impl Into<PathBuf>,
        options: DownloadOptions,
    ) -> Result<TransferStream> {
        let folder = self.folder_by_path(path, false).await?;
        let destination = destination.into();

        info!(
            folder_id = %folder,
            destination = %destination.display(),
            concurrency = options.concurrency,
            delete_after = options.delete_after,
            "Download folder files by path: {}",
            path
        );

        let transfer = self.coordinator.download_all(
            folder,
            destination,
            options.concurrency,
            options.delete_after,
        );
        debug!(transfer_id = %transfer.transfer_id(), "Transfer started");

        Ok(transfer)
    }

    /// Resolve `path` and delete the folder it names
    #[instrument(skip(self))]
    pub async fn remove_folder_by_path(&self, path: &str) -> Result<()> {
        let folder = self.folder_by_path(path, false).await?;
        debug!(folder_id = %folder, "Remove folder by path: {}", path);

        let storage = self.storage.as_ref();
        let id = folder.id.as_str();
        self.retry
            .run(id, move || storage.delete_by_id(id))
            .await?;

        info!(folder_id = id, "Removed remote folder");
        Ok(())
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Uses the reqwest HTTP client and tokio filesystem from `bridge-desktop`
/// together with the given credentials; every other setting keeps its default.
#[cfg(feature = "desktop-shims")]
pub fn bootstrap_desktop(token_provider: Arc<dyn AccessTokenProvider>) -> Result<MirrorService> {
    let config = MirrorConfig::builder()
        .token_provider(token_provider)
        .build()?;
    MirrorService::new(config)
}
