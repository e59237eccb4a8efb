//! In-memory collaborators shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::http::ByteStream;
use bridge_traits::storage::{
    EntryKind, FileSystemAccess, ListFilter, ListingPage, RemoteEntry, RemoteStorage, WriteStream,
};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

#[derive(Debug, Clone)]
struct Folder {
    id: String,
    name: String,
    parent: Option<String>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    id: String,
    name: String,
    parent: String,
    content: Vec<u8>,
    listed_size: Option<u64>,
}

#[derive(Default)]
struct DriveState {
    folders: Vec<Folder>,
    files: Vec<StoredFile>,
    next_id: usize,
    failures: HashMap<String, u32>,
    listing_failures: u32,
    delays: HashMap<String, Duration>,
    trickled: HashSet<String>,
    broken: HashSet<String>,
    bytes_read: HashMap<String, u64>,
    started: Vec<(String, HashMap<String, u64>)>,
    deleted: Vec<String>,
    created: Vec<(String, Option<String>)>,
    page_tokens: Vec<Option<String>>,
}

/// Remote store double that counts every call it receives
#[derive(Clone)]
pub struct InMemoryDrive {
    state: Arc<Mutex<DriveState>>,
    page_size: usize,
    fail_deletes: bool,
    lookups: Arc<AtomicUsize>,
    file_listings: Arc<AtomicUsize>,
    download_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for InMemoryDrive {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDrive {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DriveState::default())),
            page_size: 100,
            fail_deletes: false,
            lookups: Arc::new(AtomicUsize::new(0)),
            file_listings: Arc::new(AtomicUsize::new(0)),
            download_calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_failing_deletes(mut self) -> Self {
        self.fail_deletes = true;
        self
    }

    fn allocate_id(state: &mut DriveState, prefix: &str) -> String {
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }

    /// Add a folder under `parent` (None for root) and return its id
    pub fn add_folder(&self, name: &str, parent: Option<&str>) -> String {
        let mut state = self.state.lock().unwrap();
        let id = Self::allocate_id(&mut state, "folder");
        state.folders.push(Folder {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.map(str::to_string),
        });
        id
    }

    /// Create nested folders for `path` and return the innermost id
    pub fn add_path(&self, path: &str) -> String {
        let mut parent: Option<String> = None;
        for name in path.split('/') {
            parent = Some(self.add_folder(name, parent.as_deref()));
        }
        parent.unwrap()
    }

    pub fn add_file(&self, parent: &str, name: &str, content: Vec<u8>) -> String {
        let size = content.len() as u64;
        self.add_file_with_listed_size(parent, name, content, Some(size))
    }

    pub fn add_file_with_listed_size(
        &self,
        parent: &str,
        name: &str,
        content: Vec<u8>,
        listed_size: Option<u64>,
    ) -> String {
        let mut state = self.state.lock().unwrap();
        let id = Self::allocate_id(&mut state, "file");
        state.files.push(StoredFile {
            id: id.clone(),
            name: name.to_string(),
            parent: parent.to_string(),
            content,
            listed_size,
        });
        id
    }

    /// Make the next `count` download attempts of `name` fail with a 503
    pub fn fail_downloads(&self, name: &str, count: u32) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(name.to_string(), count);
    }

    /// Make the next `count` file listing calls fail with a 503
    pub fn fail_listings(&self, count: u32) {
        self.state.lock().unwrap().listing_failures = count;
    }

    /// Delay every download attempt of `name`
    pub fn delay_downloads(&self, name: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(name.to_string(), delay);
    }

    /// Serve `name` one byte per read, yielding to the scheduler in between
    pub fn trickle_downloads(&self, name: &str) {
        self.state.lock().unwrap().trickled.insert(name.to_string());
    }

    /// Answer every download of `name` with a malformed response
    pub fn break_downloads(&self, name: &str) {
        self.state.lock().unwrap().broken.insert(name.to_string());
    }

    /// Bytes handed out so far for `name`
    pub fn bytes_read(&self, name: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .bytes_read
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Bytes of `other` already read when `name` was first requested
    pub fn bytes_read_when_started(&self, name: &str, other: &str) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .started
            .iter()
            .find(|(started, _)| started == name)
            .map(|(_, read)| read.get(other).copied().unwrap_or(0))
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> Vec<(String, Option<String>)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn file_listings(&self) -> usize {
        self.file_listings.load(Ordering::SeqCst)
    }

    pub fn page_tokens(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().page_tokens.clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStorage for InMemoryDrive {
    async fn list_children(
        &self,
        parent_id: Option<&str>,
        filter: &ListFilter,
        page_token: Option<&str>,
    ) -> Result<ListingPage> {
        let mut state = self.state.lock().unwrap();

        match filter.kind {
            EntryKind::Folder => {
                self.lookups.fetch_add(1, Ordering::SeqCst);
                let entries = state
                    .folders
                    .iter()
                    .filter(|f| f.parent.as_deref() == parent_id)
                    .filter(|f| filter.name.as_ref().map_or(true, |n| &f.name == n))
                    .map(|f| RemoteEntry {
                        id: f.id.clone(),
                        name: f.name.clone(),
                        size: None,
                    })
                    .collect();
                Ok(ListingPage {
                    entries,
                    next_page_token: None,
                })
            }
            EntryKind::File => {
                self.file_listings.fetch_add(1, Ordering::SeqCst);
                state.page_tokens.push(page_token.map(str::to_string));

                if state.listing_failures > 0 {
                    state.listing_failures -= 1;
                    return Err(BridgeError::HttpStatus {
                        status: 503,
                        message: "backend error".to_string(),
                    });
                }

                let parent = parent_id.unwrap_or("root");
                let offset: usize = match page_token {
                    Some(token) => token
                        .parse()
                        .map_err(|_| BridgeError::InvalidResponse("bad token".to_string()))?,
                    None => 0,
                };

                let matching: Vec<&StoredFile> =
                    state.files.iter().filter(|f| f.parent == parent).collect();
                let end = (offset + self.page_size).min(matching.len());
                let entries = matching[offset.min(end)..end]
                    .iter()
                    .map(|f| RemoteEntry {
                        id: f.id.clone(),
                        name: f.name.clone(),
                        size: f.listed_size,
                    })
                    .collect();
                let next_page_token = (end < matching.len()).then(|| end.to_string());

                Ok(ListingPage {
                    entries,
                    next_page_token,
                })
            }
        }
    }

    async fn create_folder(&self, name: &str, parent_id: Option<&str>) -> Result<String> {
        let id = self.add_folder(name, parent_id);
        self.state
            .lock()
            .unwrap()
            .created
            .push((name.to_string(), parent_id.map(str::to_string)));
        Ok(id)
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        if self.fail_deletes {
            return Err(BridgeError::HttpStatus {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        self.state.lock().unwrap().deleted.push(id.to_string());
        Ok(())
    }

    async fn download_by_id(&self, id: &str) -> Result<ByteStream> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);

        let (file, delay, fail, broken, trickle) = {
            let mut state = self.state.lock().unwrap();
            let file = state
                .files
                .iter()
                .find(|f| f.id == id)
                .cloned()
                .ok_or_else(|| BridgeError::NotFound(id.to_string()))?;
            let delay = state.delays.get(&file.name).copied();
            let fail = match state.failures.get_mut(&file.name) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            };
            let snapshot = state.bytes_read.clone();
            state.started.push((file.name.clone(), snapshot));
            let broken = state.broken.contains(&file.name);
            let trickle = state.trickled.contains(&file.name);
            (file, delay, fail, broken, trickle)
        };

        if broken {
            return Err(BridgeError::InvalidResponse("broken".to_string()));
        }

        let guard = InFlightGuard::enter(Arc::clone(&self.in_flight), &self.max_in_flight);

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if fail {
            return Err(BridgeError::HttpStatus {
                status: 503,
                message: "backend error".to_string(),
            });
        }

        Ok(Box::new(TrackedReader {
            inner: io::Cursor::new(file.content),
            name: file.name,
            state: Arc::clone(&self.state),
            trickle,
            yielded: false,
            _guard: guard,
        }))
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: Arc<AtomicUsize>, max: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        max.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct TrackedReader {
    inner: io::Cursor<Vec<u8>>,
    name: String,
    state: Arc<Mutex<DriveState>>,
    trickle: bool,
    yielded: bool,
    _guard: InFlightGuard,
}

impl AsyncRead for TrackedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;

        if this.trickle && !this.yielded {
            this.yielded = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }
        this.yielded = false;

        let before = buf.filled().len();
        let result = if this.trickle {
            let mut one = [0u8; 1];
            let mut single = ReadBuf::new(&mut one);
            let result = Pin::new(&mut this.inner).poll_read(cx, &mut single);
            buf.put_slice(single.filled());
            result
        } else {
            Pin::new(&mut this.inner).poll_read(cx, buf)
        };

        let read = (buf.filled().len() - before) as u64;
        *this
            .state
            .lock()
            .unwrap()
            .bytes_read
            .entry(this.name.clone())
            .or_default() += read;

        result
    }
}

/// Local file system double keeping written bytes in memory
#[derive(Clone, Default)]
pub struct MemoryFileSystem {
    dirs: Arc<Mutex<Vec<PathBuf>>>,
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
    refuse_dirs: bool,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_dirs() -> Self {
        Self {
            refuse_dirs: true,
            ..Self::default()
        }
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().unwrap().clone()
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path.as_ref()).cloned()
    }

    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }
}

#[async_trait]
impl FileSystemAccess for MemoryFileSystem {
    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        if self.refuse_dirs {
            return Err(BridgeError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "read-only file system",
            )));
        }
        self.dirs.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn open_write_stream(&self, path: &Path) -> Result<WriteStream> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryWriter {
            path: path.to_path_buf(),
            files: Arc::clone(&self.files),
        }))
    }
}

struct MemoryWriter {
    path: PathBuf,
    files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut files = self.files.lock().unwrap();
        files.entry(self.path.clone()).or_default().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
