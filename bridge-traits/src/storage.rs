//! Storage Abstractions
//!
//! Platform-agnostic traits for the two ends of a mirror operation: the local
//! file system the bytes land in, and the remote storage they come from.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::http::ByteStream;

/// Writable byte sink handed out by [`FileSystemAccess::open_write_stream`].
pub type WriteStream = Box<dyn tokio::io::AsyncWrite + Send + Unpin>;

/// File system access trait
///
/// Abstracts the local write path. The core only ever creates directories and
/// writes bytes into streams it is handed; it never manages file handles
/// beyond that.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::FileSystemAccess;
///
/// async fn prepare(fs: &dyn FileSystemAccess, dir: &Path) -> Result<()> {
///     fs.create_dir_all(dir).await?;
///     let mut out = fs.open_write_stream(&dir.join("data.bin")).await?;
///     out.write_all(b"hello").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    /// Create a directory and all parent directories if they don't exist
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Open a file for streaming writes, truncating any previous content
    async fn open_write_stream(&self, path: &Path) -> Result<WriteStream>;
}

/// Kind of remote entry a listing is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// Listing restriction passed to [`RemoteStorage::list_children`]
///
/// Trashed entries are always excluded by implementations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListFilter {
    pub kind: EntryKind,
    /// Exact, case-sensitive name match
    pub name: Option<String>,
}

impl ListFilter {
    /// Every non-folder entry
    pub fn files() -> Self {
        Self {
            kind: EntryKind::File,
            name: None,
        }
    }

    /// Folders with exactly the given name
    pub fn folder_named(name: impl Into<String>) -> Self {
        Self {
            kind: EntryKind::Folder,
            name: Some(name.into()),
        }
    }
}

/// One remote record as returned by a listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub id: String,
    pub name: String,
    /// Size in bytes; absent for entries without binary content
    pub size: Option<u64>,
}

/// One page of a listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub entries: Vec<RemoteEntry>,
    /// Cursor for the next page; `None` once the listing is exhausted
    pub next_page_token: Option<String>,
}

/// Remote storage trait
///
/// Thin typed call interface to a cloud file store. Each method is exactly
/// one remote round trip: no retry, no pagination. Errors are surfaced as the
/// remote reported them; classification happens in the caller.
///
/// A `parent_id` of `None` addresses the store's root folder.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// List one page of children of a folder
    async fn list_children(
        &self,
        parent_id: Option<&str>,
        filter: &ListFilter,
        page_token: Option<&str>,
    ) -> Result<ListingPage>;

    /// Create a folder and return its identifier
    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<String>;

    /// Delete a file or folder by identifier
    async fn delete_by_id(&self, id: &str) -> Result<()>;

    /// Open the content of a file as a byte stream
    async fn download_by_id(&self, id: &str) -> Result<ByteStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_filter_constructors() {
        let files = ListFilter::files();
        assert_eq!(files.kind, EntryKind::File);
        assert!(files.name.is_none());

        let folder = ListFilter::folder_named("2024");
        assert_eq!(folder.kind, EntryKind::Folder);
        assert_eq!(folder.name.as_deref(), Some("2024"));
    }

    #[test]
    fn test_default_page_is_exhausted() {
        let page = ListingPage::default();
        assert!(page.entries.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
