//! Shared, retried pod operations.

use crate::clock::Clock;
use crate::error::Result;
use crate::mirror::LocalMirror;
use crate::retry::{RetryPolicy, retry};
use podanchor_ledger::LedgerHandle;
use podanchor_storage::error::{ErrorKind as StorageErrorKind, Result as StorageResult};
use podanchor_storage::{BackendHandle, ContentType, ItemInfo, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where one device's files live in a pod: `{collection}/{device}/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodLayout {
    collection: String,
    device: String,
}

impl PodLayout {
    pub fn new(collection: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            device: device.into(),
        }
    }

    pub fn collection_folder(&self) -> PathBuf {
        PathBuf::from(&self.collection)
    }

    pub fn device_folder(&self) -> PathBuf {
        self.collection_folder().join(&self.device)
    }

    /// Path of a file in the device folder. `remote_name` must already be escaped.
    pub fn file(&self, remote_name: &str) -> PathBuf {
        self.device_folder().join(remote_name)
    }
}

/// Everything a strategy or the verifier needs besides the sensor.
#[derive(Clone)]
pub struct Context {
    pub backend: BackendHandle,
    pub ledger: LedgerHandle,
    pub mirror: LocalMirror,
    pub clock: Arc<dyn Clock>,
    pub retry: RetryPolicy,
}

/// Check-then-create. Losing the race to another creator is not an error.
async fn ensure_folder_once(backend: &dyn StorageBackend, folder: &Path) -> StorageResult<bool> {
    if backend.exists(folder).await? {
        return Ok(false);
    }
    match backend.create_folder(folder).await {
        Ok(()) => Ok(true),
        Err(err) if matches!(&*err, StorageErrorKind::AlreadyExists(_)) => Ok(false),
        Err(err) => Err(err),
    }
}

async fn create_file_once(backend: &dyn StorageBackend, path: &Path, initial: &[u8], content_type: ContentType) -> StorageResult<bool> {
    if backend.exists(path).await? {
        return Ok(false);
    }
    backend.write(path, initial, content_type).await?;
    Ok(true)
}

impl Context {
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub async fn ensure_folder(&self, folder: &Path) -> Result<()> {
        let backend = self.backend.as_ref();
        let created = retry(&self.retry, self.clock(), "check if folder exists", move || ensure_folder_once(backend, folder)).await?;
        if created {
            tracing::info!(backend = backend.name(), folder = %folder.display(), "Created folder");
        }
        Ok(())
    }

    /// Ensure the collection folder, then the device folder inside it.
    pub async fn ensure_layout(&self, layout: &PodLayout) -> Result<()> {
        self.ensure_folder(&layout.collection_folder()).await?;
        self.ensure_folder(&layout.device_folder()).await
    }

    /// Create `path` with `initial` content unless it exists. Returns whether it was created.
    pub async fn create_file_if_absent(&self, path: &Path, initial: &[u8], content_type: ContentType) -> Result<bool> {
        let backend = self.backend.as_ref();
        let created = retry(&self.retry, self.clock(), "check if file exists", move || {
            create_file_once(backend, path, initial, content_type)
        })
        .await?;
        if created {
            tracing::info!(backend = backend.name(), path = %path.display(), "Created file");
        }
        Ok(created)
    }

    pub async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let backend = self.backend.as_ref();
        retry(&self.retry, self.clock(), "read file", move || backend.read(path)).await
    }

    pub async fn write(&self, path: &Path, data: &[u8], content_type: ContentType) -> Result<()> {
        let backend = self.backend.as_ref();
        retry(&self.retry, self.clock(), "add data to Pod", move || backend.write(path, data, content_type)).await
    }

    pub async fn list(&self, folder: &Path) -> Result<Vec<ItemInfo>> {
        let backend = self.backend.as_ref();
        retry(&self.retry, self.clock(), "list folder", move || backend.list(folder)).await
    }
}
