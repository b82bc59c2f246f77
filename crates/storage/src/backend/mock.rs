//! In-memory storage backend for testing.

use super::ItemInfoStream;
use crate::error::{ErrorKind, Result};
use crate::models::{ContentType, ItemInfo};
use crate::path::validate as validate_path;
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::StorageBackend;

#[derive(Default)]
struct Pod {
    folders: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, (ContentType, Vec<u8>)>,
}

/// In-memory storage backend for testing.
///
/// Folders and files are kept behind a [`RwLock`], so all trait methods
/// operate on `&self`. Besides storage it counts operations and can be told to
/// fail the next few of them with a network error, which is what transient
/// pod outages look like to callers.
///
/// # Examples
///
/// ```
/// use podanchor_storage::{ContentType, backend::{MockBackend, StorageBackend}};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("csv-aqm-data/aqm1/2022-03-21.csv", b"date,time,o3"),
/// ]);
/// assert!(backend.exists(Path::new("csv-aqm-data/aqm1")).await?);
///
/// backend.fail_next(1);
/// assert!(backend.read(Path::new("csv-aqm-data/aqm1/2022-03-21.csv")).await.is_err());
/// assert!(backend.read(Path::new("csv-aqm-data/aqm1/2022-03-21.csv")).await.is_ok());
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    pod: RwLock<Pod>,
    failures: AtomicUsize,
    operations: AtomicUsize,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files. Parent folders are
    /// created implicitly.
    ///
    /// Panics if any path fails validation. If test setup is wrong, then the
    /// test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut pod = Pod::default();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = validate_path(&path) else {
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            Self::add_parents(&mut pod, &validated);
            let content_type = match validated.extension().and_then(|ext| ext.to_str()) {
                Some("ttl") => ContentType::Turtle,
                _ => ContentType::Csv,
            };
            pod.files.insert(validated, (content_type, data.into()));
        }
        Self {
            name: "mock".to_string(),
            pod: RwLock::new(pod),
            failures: AtomicUsize::new(0),
            operations: AtomicUsize::new(0),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make the next `count` operations fail with a network error.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Number of operations attempted so far (including failed ones).
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Content type a file was last written with.
    pub async fn content_type(&self, path: impl AsRef<Path>) -> Option<ContentType> {
        let path = validate_path(path.as_ref()).ok()?;
        self.pod.read().await.files.get(&path).map(|(content_type, _)| *content_type)
    }

    fn add_parents(pod: &mut Pod, path: &Path) {
        for ancestor in path.ancestors().skip(1) {
            if !ancestor.as_os_str().is_empty() {
                pod.folders.insert(ancestor.to_path_buf());
            }
        }
    }

    fn attempt(&self) -> Result<()> {
        self.operations.fetch_add(1, Ordering::SeqCst);
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |remaining| remaining.checked_sub(1))
            .is_ok();
        if injected {
            exn::bail!(ErrorKind::Network("injected failure".to_string()));
        }
        Ok(())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, folder: &'a Path) -> ItemInfoStream<'a> {
        let validated = match self.attempt().and_then(|()| validate_path(folder)) {
            Ok(folder) => folder,
            Err(e) => return Box::pin(futures::stream::once(async { Err(e) })),
        };

        Box::pin(stream! {
            // Snapshot matching entries under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let children: Vec<ItemInfo> = {
                let guard = self.pod.read().await;
                let is_child = |path: &&PathBuf| path.parent() == Some(validated.as_path());
                let name = |path: &PathBuf| path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                guard.folders.iter().filter(is_child).map(|path| ItemInfo::folder(&validated, name(path)))
                    .chain(guard.files.keys().filter(is_child).map(|path| ItemInfo::file(&validated, name(path))))
                    .collect()
            };
            for item in children {
                yield Ok(item);
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.attempt()?;
        let path = validate_path(path)?;
        let guard = self.pod.read().await;
        Ok(guard.folders.contains(&path) || guard.files.contains_key(&path))
    }

    async fn create_folder(&self, path: &Path) -> Result<()> {
        self.attempt()?;
        let path = validate_path(path)?;
        let mut guard = self.pod.write().await;
        if guard.folders.contains(&path) || guard.files.contains_key(&path) {
            exn::bail!(ErrorKind::AlreadyExists(path));
        }
        Self::add_parents(&mut guard, &path);
        guard.folders.insert(path);
        Ok(())
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.attempt()?;
        let path = validate_path(path)?;
        let (_content_type, data) =
            self.pod.read().await.files.get(&path).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(path)))?;
        Ok(data)
    }

    async fn write(&self, path: &Path, data: &[u8], content_type: ContentType) -> Result<()> {
        self.attempt()?;
        let path = validate_path(path)?;
        let mut guard = self.pod.write().await;
        Self::add_parents(&mut guard, &path);
        guard.files.insert(path, (content_type, data.to_vec()));
        Ok(())
    }
}
