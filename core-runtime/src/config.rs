//! # Mirror Configuration Module
//!
//! Provides configuration management for the drive mirror core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `MirrorConfig` instance that holds every host capability and tunable the
//! engine needs. It enforces fail-fast validation so that a missing bridge is
//! reported at startup instead of in the middle of a transfer.
//!
//! ## Required Dependencies
//!
//! - `AccessTokenProvider` - Furnishes the credential for every remote call
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `HttpClient` - HTTP operations (desktop default: reqwest)
//! - `FileSystemAccess` - Local writes (desktop default: tokio fs)
//! - `AdmissionLimiter` - Process-wide remote call pacing (default: unthrottled)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::MirrorConfig;
//! use bridge_traits::StaticTokenProvider;
//! use std::sync::Arc;
//!
//! let config = MirrorConfig::builder()
//!     .token_provider(Arc::new(StaticTokenProvider::new("ya29...")))
//!     .default_concurrency(8)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    AccessTokenProvider, AdmissionLimiter, FileSystemAccess, HttpClient, Unthrottled,
};
use core_sync::DEFAULT_MAX_ATTEMPTS;
use std::sync::Arc;
use std::time::Duration;

/// Downloads in flight when the caller does not choose
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Timeout applied to metadata calls (list, create, delete)
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Mirror configuration
///
/// Holds all dependencies and settings required to run mirror operations.
/// Use [`MirrorConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct MirrorConfig {
    /// Credential source for the remote store (required)
    pub token_provider: Arc<dyn AccessTokenProvider>,

    /// HTTP client used by the remote adapter
    pub http_client: Arc<dyn HttpClient>,

    /// Local file system the mirrored files are written to
    pub file_system: Arc<dyn FileSystemAccess>,

    /// Shared gate every remote call passes through
    pub admission_limiter: Arc<dyn AdmissionLimiter>,

    /// Attempts per remote call, including the first one
    pub max_attempts: u32,

    /// Concurrent downloads when [`DownloadOptions`] does not override it
    pub default_concurrency: usize,

    /// Timeout for non-streaming remote calls
    pub request_timeout: Duration,
}

impl std::fmt::Debug for MirrorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorConfig")
            .field("token_provider", &"AccessTokenProvider { ... }")
            .field("http_client", &"HttpClient { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field("admission_limiter", &"AdmissionLimiter { ... }")
            .field("max_attempts", &self.max_attempts)
            .field("default_concurrency", &self.default_concurrency)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl MirrorConfig {
    /// Creates a new builder for constructing a `MirrorConfig`.
    pub fn builder() -> MirrorConfigBuilder {
        MirrorConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        if self.default_concurrency == 0 {
            return Err(Error::Config(
                "default_concurrency must be at least 1".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "request_timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Per-call options seeded from this configuration
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            concurrency: self.default_concurrency,
            delete_after: false,
        }
    }
}

/// Options for a single mirror download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadOptions {
    /// Maximum downloads in flight at once
    pub concurrency: usize,
    /// Delete the remote folder once every file has been written
    pub delete_after: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            delete_after: false,
        }
    }
}

impl DownloadOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_delete_after(mut self, delete_after: bool) -> Self {
        self.delete_after = delete_after;
        self
    }
}

fn token_provider_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "AccessTokenProvider".to_string(),
        message: "An AccessTokenProvider is required to authenticate remote calls. \
                 Inject the host's OAuth session, or a StaticTokenProvider for scripts."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for remote calls. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Other hosts: inject a platform-native HTTP client."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "FileSystemAccess implementation is required to write mirrored files. \
                 Desktop: enable the 'desktop-shims' feature to use the default TokioFileSystem."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: format!("Failed to create default ReqwestHttpClient: {}", e),
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem);
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

/// Builder for constructing [`MirrorConfig`] instances.
///
/// Call [`build()`](MirrorConfigBuilder::build) once every required
/// capability has been set.
#[derive(Default)]
pub struct MirrorConfigBuilder {
    token_provider: Option<Arc<dyn AccessTokenProvider>>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    admission_limiter: Option<Arc<dyn AdmissionLimiter>>,
    max_attempts: Option<u32>,
    default_concurrency: Option<usize>,
    request_timeout: Option<Duration>,
}

impl MirrorConfigBuilder {
    /// Sets the access token provider (required).
    pub fn token_provider(mut self, provider: Arc<dyn AccessTokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the file system access implementation.
    ///
    /// If not provided, the desktop default (tokio fs-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    /// Sets the process-wide admission limiter.
    ///
    /// Share one instance between every service talking to the same account.
    /// Default: no throttling.
    pub fn admission_limiter(mut self, limiter: Arc<dyn AdmissionLimiter>) -> Self {
        self.admission_limiter = Some(limiter);
        self
    }

    /// Default: 3
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Default: 4
    pub fn default_concurrency(mut self, concurrency: usize) -> Self {
        self.default_concurrency = Some(concurrency);
        self
    }

    /// Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builds the final `MirrorConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required bridge is absent and no
    ///   platform default exists
    /// - [`Error::Config`] when a tunable is out of range
    pub fn build(self) -> Result<MirrorConfig> {
        let token_provider = self
            .token_provider
            .ok_or_else(token_provider_missing_error)?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let admission_limiter = self
            .admission_limiter
            .unwrap_or_else(|| Arc::new(Unthrottled));

        let config = MirrorConfig {
            token_provider,
            http_client,
            file_system,
            admission_limiter,
            max_attempts: self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            default_concurrency: self.default_concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        };

        config.validate()?;

        Ok(config)
    }
}
