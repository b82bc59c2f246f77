//! Committing mirrored files to the ledger.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use podanchor_ledger::{Digest, Ledger};
use std::path::Path;

/// A digest the ledger accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchored {
    pub digest: Digest,
    pub sequence: u64,
}

/// Hash the file at `path` as it is on disk right now and append the digest.
///
/// Never retried: a second attempt after an append that actually landed would
/// anchor the same file twice.
pub async fn anchor(ledger: &dyn Ledger, path: &Path) -> Result<Anchored> {
    let digest = Digest::of_file(path).await.or_raise(|| ErrorKind::Ledger)?;
    let sequence = ledger.append(digest).await.or_raise(|| ErrorKind::Ledger)?;
    tracing::info!(path = %path.display(), %digest, sequence, "File hash anchored");
    Ok(Anchored { digest, sequence })
}

/// [`anchor`], with failures logged instead of returned.
pub async fn anchor_logged(ledger: &dyn Ledger, path: &Path) -> Option<Anchored> {
    match anchor(ledger, path).await {
        Ok(anchored) => Some(anchored),
        Err(err) => {
            tracing::error!(path = %path.display(), error = ?err, "Unable to anchor file hash; continuing without it");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use podanchor_ledger::MemoryLedger;

    #[tokio::test]
    async fn test_anchor_hashes_disk_bytes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("2022-03-21.csv");
        tokio::fs::write(&path, b"date,time,o3\n2022-03-21,11:19:47,1.0").await.unwrap();
        let ledger = MemoryLedger::new();

        let anchored = anchor(&ledger, &path).await.unwrap();
        assert_eq!(anchored.digest, Digest::of(b"date,time,o3\n2022-03-21,11:19:47,1.0"));
        assert_eq!(anchored.sequence, 1);
        assert!(ledger.contains(&anchored.digest).await.unwrap());
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger = MemoryLedger::new();
        assert_eq!(anchor_logged(&ledger, &temp_dir.path().join("missing.csv")).await, None);

        let path = temp_dir.path().join("2022-03-21.csv");
        tokio::fs::write(&path, b"data").await.unwrap();
        ledger.fail_next(1);
        assert_eq!(anchor_logged(&ledger, &path).await, None);
        assert_eq!(ledger.count().await.unwrap(), 0);
    }
}
