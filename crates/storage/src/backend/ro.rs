//! Read-only storage backend.
//!
//! Wraps another backend and refuses to change anything. The verifier opens
//! pods through this so a verification run can never alter the files it is
//! judging.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{ErrorKind, Result};
use crate::{BackendHandle, ContentType, ItemInfo, StorageBackend, backend::ItemInfoStream};

/// Read-only storage backend.
///
/// Reads pass through to the wrapped backend; writes and folder creation fail
/// with [`PermissionDenied`](ErrorKind::PermissionDenied) and log a
/// [`warn event`](tracing::Event).
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_stream<'a>(&'a self, folder: &'a Path) -> ItemInfoStream<'a> {
        self.inner.list_stream(folder)
    }

    async fn list(&self, folder: &Path) -> Result<Vec<ItemInfo>> {
        self.inner.list(folder).await
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn create_folder(&self, path: &Path) -> Result<()> {
        tracing::warn!(backend = self.name(), path = %path.display(), "Refusing to create folder in read-only mode");
        exn::bail!(ErrorKind::PermissionDenied(path.to_path_buf()))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8], _content_type: ContentType) -> Result<()> {
        tracing::warn!(backend = self.name(), path = %path.display(), bytes = data.len(), "Refusing to write in read-only mode");
        exn::bail!(ErrorKind::PermissionDenied(path.to_path_buf()))
    }
}
