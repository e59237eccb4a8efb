//! # Folder Enumerator
//!
//! Walks every page of a folder's file listing. Each call starts a fresh
//! listing; no page token survives between calls. Folders and trashed
//! entries never appear.

use bridge_traits::storage::{ListFilter, RemoteEntry, RemoteStorage};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::resolver::FolderRef;
use crate::retry::RetryPolicy;

/// One listed remote file
pub type FileEntry = RemoteEntry;

/// Number and total size of the files in a folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderTotals {
    pub files: u64,
    pub bytes: u64,
}

impl FolderTotals {
    pub fn record(&mut self, entry: &FileEntry) {
        self.files += 1;
        self.bytes += entry.size.unwrap_or(0);
    }
}

/// Paginated listing of the files directly inside a folder
#[derive(Clone)]
pub struct FolderEnumerator {
    storage: Arc<dyn RemoteStorage>,
    retry: RetryPolicy,
}

impl FolderEnumerator {
    pub fn new(storage: Arc<dyn RemoteStorage>, retry: RetryPolicy) -> Self {
        Self { storage, retry }
    }

    /// Lazily fetch the file listing one page at a time, in listing order
    ///
    /// The next page is only requested once the previous one was consumed.
    pub fn pages(&self, folder: &FolderRef) -> BoxStream<'static, Result<Vec<FileEntry>>> {
        self.pages_matching(folder, ListFilter::files())
    }

    fn pages_matching(
        &self,
        folder: &FolderRef,
        filter: ListFilter,
    ) -> BoxStream<'static, Result<Vec<RemoteEntry>>> {
        let storage = Arc::clone(&self.storage);
        let retry = self.retry.clone();
        let folder_id = folder.id.clone();

        // None: exhausted, Some(None): first page, Some(Some(token)): next page
        stream::try_unfold(Some(None::<String>), move |cursor| {
            let storage = Arc::clone(&storage);
            let retry = retry.clone();
            let folder_id = folder_id.clone();
            let filter = filter.clone();

            async move {
                let Some(page_token) = cursor else {
                    return Ok::<_, SyncError>(None);
                };

                let remote = storage.as_ref();
                let id = folder_id.as_str();
                let token = page_token.as_deref();
                let filter = &filter;

                let page = retry
                    .run(id, move || remote.list_children(Some(id), filter, token))
                    .await?;

                debug!(
                    folder_id = id,
                    entries = page.entries.len(),
                    more = page.next_page_token.is_some(),
                    "Fetched listing page"
                );

                let next = page.next_page_token.map(Some);
                Ok(Some((page.entries, next)))
            }
        })
        .boxed()
    }

    /// Lazily yield every file of the folder, page after page
    pub fn entries(&self, folder: &FolderRef) -> BoxStream<'static, Result<FileEntry>> {
        self.pages(folder)
            .map_ok(|page| stream::iter(page.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    /// Collect every entry of the folder that matches `filter`
    pub async fn list_all(
        &self,
        folder: &FolderRef,
        filter: &ListFilter,
    ) -> Result<Vec<RemoteEntry>> {
        self.pages_matching(folder, filter.clone())
            .try_concat()
            .await
    }

    /// Count files and bytes across all pages without keeping the entries
    pub async fn totals(&self, folder: &FolderRef) -> Result<FolderTotals> {
        self.pages(folder)
            .try_fold(FolderTotals::default(), |mut totals, page| async move {
                page.iter().for_each(|entry| totals.record(entry));
                Ok(totals)
            })
            .await
    }
}
