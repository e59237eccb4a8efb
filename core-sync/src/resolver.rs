//! # Path Resolver
//!
//! Turns a `/`-delimited folder path into the identifier of the remote folder
//! it names, optionally creating missing segments on the way down.
//!
//! Resolution is strictly sequential: each lookup needs the identifier found
//! by the previous one. Duplicate folder names under one parent resolve to
//! the first match in listing order.

use bridge_traits::storage::{ListFilter, RemoteStorage};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};
use crate::retry::RetryPolicy;

/// Ordered folder names from the root down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    /// Split a `/`-delimited path into segments
    ///
    /// Empty segments (leading, trailing or doubled slashes) are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Fatal`] when no segment remains.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(SyncError::Fatal(format!(
                "Folder path '{}' has no segments",
                path
            )));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Opaque remote folder identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FolderRef {
    pub id: String,
}

impl FolderRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for FolderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Resolves folder paths against a remote store
pub struct PathResolver {
    storage: Arc<dyn RemoteStorage>,
    retry: RetryPolicy,
}

impl PathResolver {
    pub fn new(storage: Arc<dyn RemoteStorage>, retry: RetryPolicy) -> Self {
        Self { storage, retry }
    }

    /// Resolve `path` to a folder, creating missing segments if asked to
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotFound`] carrying the full `path` when a segment is
    ///   missing and `create_missing` is false; no folder is created then
    /// - [`SyncError::Transient`] / [`SyncError::Fatal`] from the remote calls
    #[instrument(skip(self), fields(path = %path))]
    pub async fn resolve(&self, path: &FolderPath, create_missing: bool) -> Result<FolderRef> {
        debug!(
            "Get {}folder by path: {}",
            if create_missing { "or create " } else { "" },
            path
        );

        let full_path = path.to_string();
        let mut parent: Option<String> = None;

        for name in path.segments() {
            let found = self
                .find_folder(name, parent.as_deref())
                .await
                .map_err(|e| e.with_path(&full_path))?;

            let id = match found {
                Some(id) => id,
                None if create_missing => self
                    .create_folder(name, parent.as_deref())
                    .await
                    .map_err(|e| e.with_path(&full_path))?,
                None => {
                    let reason = match &parent {
                        Some(parent_id) => {
                            format!("Directory \"{}\" not found in parent {}", name, parent_id)
                        }
                        None => format!("Directory \"{}\" not found", name),
                    };
                    return Err(SyncError::not_found(full_path, reason));
                }
            };
            parent = Some(id);
        }

        // FolderPath is never empty, so the loop ran at least once
        parent
            .map(FolderRef::new)
            .ok_or_else(|| SyncError::Fatal("Folder path has no segments".to_string()))
    }

    async fn find_folder(&self, name: &str, parent_id: Option<&str>) -> Result<Option<String>> {
        let storage = self.storage.as_ref();
        let filter = &ListFilter::folder_named(name);
        let page = self
            .retry
            .run(name, move || storage.list_children(parent_id, filter, None))
            .await?;

        Ok(page
            .entries
            .into_iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.id))
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<String> {
        let storage = self.storage.as_ref();
        let id = self
            .retry
            .run(name, move || storage.create_folder(name, parent_id))
            .await?;
        info!(name, id = %id, "Created remote folder");
        Ok(id)
    }
}
