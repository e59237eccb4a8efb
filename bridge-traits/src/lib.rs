//! # Host Bridge Traits
//!
//! Capability traits the mirror core requires from its host.
//!
//! ## Overview
//!
//! This crate defines the contract between the synchronization core and the
//! collaborators it treats as external: the remote storage API, the local file
//! system, the authenticated session and the shared admission limiter.
//!
//! ## Traits
//!
//! ### Networking & I/O
//! - [`HttpClient`](http::HttpClient) - Single round-trip HTTP calls and streamed bodies
//! - [`RemoteStorage`](storage::RemoteStorage) - Typed cloud file store operations
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Local directory creation and write streams
//!
//! ### Session & Pacing
//! - [`AccessTokenProvider`](auth::AccessTokenProvider) - Bearer tokens for each remote call
//! - [`AdmissionLimiter`](limiter::AdmissionLimiter) - Process-wide gate for remote calls
//!
//! ### Utilities
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map "resource does not exist" to `BridgeError::NotFound` and
//! unparseable payloads to `BridgeError::InvalidResponse`; the core relies on
//! that distinction when deciding whether to retry.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod auth;
pub mod error;
pub mod http;
pub mod limiter;
pub mod log;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use auth::{AccessTokenProvider, StaticTokenProvider};
pub use http::{ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use limiter::{AdmissionLimiter, AdmissionPermit, Unthrottled};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::{
    EntryKind, FileSystemAccess, ListFilter, ListingPage, RemoteEntry, RemoteStorage, WriteStream,
};
