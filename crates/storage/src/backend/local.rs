//! Local filesystem storage backend.
//!
//! A pod laid out as a plain directory tree: folders are directories and
//! resource names (still URL-escaped) are file names. Useful for running the
//! harvester without a pod server, and for inspecting what would be written.

use crate::backend::ItemInfoStream;
use crate::error::ErrorKind;
use crate::{ContentType, ItemInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry};

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use podanchor_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = LocalBackend::new("local", "/var/lib/podanchor/pod")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Root directory standing in for the pod root
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Use non-async here; it only happens once at startup and it's not
            // worth making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    /// Validates the path and joins it with the root directory.
    fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    async fn process_entry(folder: &Path, entry: DirEntry) -> Result<Option<ItemInfo>> {
        let path = entry.path();
        let file_type = entry.file_type().await.map_err(|e| Self::map_io_error(e, &path))?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            // Pods only hand out UTF-8 names; anything else was not written by us.
            tracing::debug!(path = %path.display(), "Skipping non UTF-8 file name");
            return Ok(None);
        };
        if file_type.is_dir() {
            return Ok(Some(ItemInfo::folder(folder, name)));
        }
        if file_type.is_file() {
            return Ok(Some(ItemInfo::file(folder, name)));
        }
        // Note: silently drop what is most likely a broken symlink.
        Ok(None)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, folder: &'a Path) -> ItemInfoStream<'a> {
        let validated = match validate_path(folder) {
            Ok(folder) => folder,
            Err(e) => return Box::pin(futures::stream::once(async { Result::Err(e) })),
        };
        Box::pin(stream! {
            let absolute = self.root.join(&validated);
            let mut entries = match fs::read_dir(&absolute).await {
                Ok(entries) => entries,
                // Consistent with HTTP pods: a missing folder lists as empty.
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return,
                Err(err) => {
                    yield Err(exn::Exn::from(Self::map_io_error(err, &validated)));
                    return;
                },
            };
            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &validated))); continue; },
                };
                match Self::process_entry(&validated, entry).await {
                    Ok(Some(item)) => yield Ok(item),
                    Ok(None) => {},
                    Err(e) => yield Err(e),
                }
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn create_folder(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::create_dir(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8], content_type: ContentType) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        // Create parent folders if needed, like pod servers do on PUT.
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        tracing::trace!(path = %path.display(), %content_type, bytes = data.len(), "Writing local pod file");
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("local", temp_dir.path()).unwrap();
        (temp_dir, backend)
    }

    #[test]
    fn test_new_requires_absolute_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::new("name", temp_dir.path()).is_ok());
        assert!(LocalBackend::new("name", "relative/path").is_err());
    }

    #[test]
    fn test_absolute_path() {
        let (temp_dir, backend) = backend();
        let expected = temp_dir.path().join("csv-aqm-data/aqm1/2022-03-21.csv");
        assert_eq!(backend.absolute_path("csv-aqm-data/aqm1/2022-03-21.csv").unwrap(), expected);
        assert!(backend.absolute_path("../etc/passwd").is_err());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("aqm1/2022-03-21.csv"), b"date,time,o3", ContentType::Csv).await.unwrap();
        let data = backend.read(Path::new("aqm1/2022-03-21.csv")).await.unwrap();
        assert_eq!(data, b"date,time,o3");
    }

    #[tokio::test]
    async fn test_write_replaces_whole_file() {
        let (_temp_dir, backend) = backend();
        let path = Path::new("aqm1/2022-03-21.csv");
        backend.write(path, b"a much longer first version", ContentType::Csv).await.unwrap();
        backend.write(path, b"short", ContentType::Csv).await.unwrap();
        assert_eq!(backend.read(path).await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_create_folder() {
        let (_temp_dir, backend) = backend();
        assert!(!backend.exists(Path::new("csv-aqm-data")).await.unwrap());
        backend.create_folder(Path::new("csv-aqm-data")).await.unwrap();
        assert!(backend.exists(Path::new("csv-aqm-data")).await.unwrap());
        let err = backend.create_folder(Path::new("csv-aqm-data")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_read_not_found() {
        let (_temp_dir, backend) = backend();
        let err = backend.read(Path::new("missing.csv")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_immediate_children() {
        let (_temp_dir, backend) = backend();
        backend.write(Path::new("aqm1/2022-03-21.csv"), b"1", ContentType::Csv).await.unwrap();
        backend.write(Path::new("aqm1/2022-03-22.csv"), b"2", ContentType::Csv).await.unwrap();
        backend.write(Path::new("aqm1/nested/2022-03-23.csv"), b"3", ContentType::Csv).await.unwrap();
        let mut items = backend.list(Path::new("aqm1")).await.unwrap();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], ItemInfo::file("aqm1", "2022-03-21.csv"));
        assert_eq!(items[1], ItemInfo::file("aqm1", "2022-03-22.csv"));
        assert_eq!(items[2], ItemInfo::folder("aqm1", "nested"));
    }

    #[tokio::test]
    async fn test_list_missing_folder_is_empty() {
        let (_temp_dir, backend) = backend();
        assert!(backend.list(Path::new("nonexistent")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_path_security() {
        let (_temp_dir, backend) = backend();
        assert!(backend.read(Path::new("../etc/passwd")).await.is_err());
        assert!(backend.write(Path::new("../escape.csv"), b"data", ContentType::Csv).await.is_err());
        assert!(backend.create_folder(Path::new("../../escape")).await.is_err());
    }
}
