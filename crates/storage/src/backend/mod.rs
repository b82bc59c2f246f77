//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, a unified interface over
//! the places a pod can live: a Solid-style HTTP server, a directory on the
//! local filesystem, or memory (for tests).
//!

#[cfg(feature = "http")]
mod http;
mod local;
#[cfg(feature = "mock")]
mod mock;
mod ro;

#[cfg(feature = "http")]
pub use self::http::HttpBackend;
pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use crate::models::{ContentType, ItemInfo};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub type ItemInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<ItemInfo>> + Send + 'a>>;

/// Unified interface for pod storage.
///
/// Pods have no partial writes: a file is created or replaced as a whole,
/// along with its declared [`ContentType`]. Appending is the caller's job
/// (read everything, concatenate, write everything back).
///
/// # Path Handling
/// All paths are relative to the pod root and must be validated using
/// [`validate_path`](crate::validate_path) before use. Implementations should
/// enforce this validation. Resource names are passed through verbatim, so
/// they must already be escaped with [`encode_name`](crate::encode_name).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use podanchor_storage::{ContentType, backend::StorageBackend, error::Result};
///
/// async fn append_line(backend: &dyn StorageBackend, path: &Path, line: &str) -> Result<()> {
///     let mut content = match backend.exists(path).await? {
///         true => backend.read(path).await?,
///         false => Vec::new(),
///     };
///     content.extend_from_slice(b"\n");
///     content.extend_from_slice(line.as_bytes());
///     backend.write(path, &content, ContentType::Csv).await
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// List the immediate children of a folder.
    ///
    /// Default implementation of this method is to collect all the results
    /// from [`list_stream()`](Self::list_stream) into a [`Vec`] before
    /// returning.
    async fn list(&self, folder: &Path) -> Result<Vec<ItemInfo>> {
        self.list_stream(folder).try_collect().await
    }

    /// Stream the immediate children of a folder.
    ///
    /// A folder that does not exist yields nothing rather than an error, so
    /// listing a freshly configured device folder behaves like an empty one.
    /// Order is unspecified; callers sort when order matters.
    fn list_stream<'a>(&'a self, folder: &'a Path) -> ItemInfoStream<'a>;

    /// Check if a file or folder exists.
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Create a folder.
    ///
    /// Returns [`AlreadyExists`](crate::error::ErrorKind::AlreadyExists) if
    /// the folder is already there. Callers doing "create if absent" should
    /// treat that as success: check-then-create is not atomic.
    async fn create_folder(&self, path: &Path) -> Result<()>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents, creating the file or replacing it entirely.
    async fn write(&self, path: &Path, data: &[u8], content_type: ContentType) -> Result<()>;
}
