//! # Google Drive Provider
//!
//! Implements the `RemoteStorage` trait for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Paged child listings filtered by folder/file type and exact name
//! - Folder creation under a parent (or the drive root)
//! - Deletion by identifier
//! - Streaming content downloads
//!
//! Every call is a single round trip authorized with a token fetched from the
//! injected `AccessTokenProvider`. Retry and pacing are left to the caller.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::{GoogleDriveConnector, FOLDER_MIME_TYPE};
pub use error::{GoogleDriveError, Result};
