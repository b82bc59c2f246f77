//! Local mirror of the most recently written pod file.
//!
//! Digests are always computed over the mirror as it is on disk, so what gets
//! anchored is exactly the bytes the pod handed back.

use crate::error::{ErrorKind, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct LocalMirror {
    dir: PathBuf,
}

impl LocalMirror {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a file called `name` (decoded) is mirrored.
    ///
    /// Names come from pod listings too, so anything that is not a single
    /// plain file name is refused.
    pub fn path_of(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(self.dir.join(name)),
            _ => exn::bail!(ErrorKind::InvalidName(name.to_string())),
        }
    }

    /// Write `bytes` as the mirror of `name`, replacing any previous copy.
    pub async fn write(&self, name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.path_of(name)?;
        fs::create_dir_all(&self.dir).await.map_err(ErrorKind::Mirror)?;
        fs::write(&path, bytes).await.map_err(ErrorKind::Mirror)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Mirrored file locally");
        Ok(path)
    }

    /// Remove a mirrored file. Already gone is fine.
    pub async fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => exn::bail!(ErrorKind::Mirror(e)),
        }
    }
}
