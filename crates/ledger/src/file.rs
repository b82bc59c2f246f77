//! File-backed ledger.
//!
//! Entries are stored one JSON object per line. Each entry links to the one
//! before it through a running hash chain:
//!
//! ```text
//! chain[n] = blake3(chain[n - 1] || digest[n])      chain[0] = 0x00..00
//! ```
//!
//! The whole chain is re-verified whenever the ledger is opened, so an edited,
//! removed or re-ordered line is reported instead of silently trusted.

use crate::error::{ErrorKind, Result};
use crate::{Digest, Ledger};
use async_trait::async_trait;
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One line of the ledger file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// 1-based position in the ledger
    pub sequence: u64,
    pub digest: Digest,
    /// Chain value of the previous entry
    pub previous: Digest,
    pub chain: Digest,
    #[serde(with = "time::serde::rfc3339")]
    pub anchored_at: OffsetDateTime,
}

pub struct FileLedger {
    path: PathBuf,
    entries: Mutex<Vec<Entry>>,
    #[cfg(test)]
    fail_after_write: std::sync::atomic::AtomicBool,
}

impl FileLedger {
    /// Open (or start) the ledger at `path`, verifying every existing entry.
    ///
    /// A final line that is cut short (no trailing newline, not a complete
    /// entry) is an append that was never acknowledged; it is dropped from
    /// the file with a warning.
    ///
    /// # Errors
    ///
    /// [`Corrupt`](ErrorKind::Corrupt) if any other line is not a ledger
    /// entry and [`Tampered`](ErrorKind::Tampered) if an entry does not follow
    /// from its predecessor.
    #[tracing::instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => exn::bail!(ErrorKind::Io(e)),
        };
        let (entries, intact) = Self::verify(&path, &content)?;
        if intact < content.len() {
            tracing::warn!(
                path = %path.display(),
                dropped_bytes = content.len() - intact,
                "Discarding an unfinished ledger entry"
            );
            let file = OpenOptions::new().write(true).open(&path).await.map_err(ErrorKind::Io)?;
            file.set_len(intact as u64).await.map_err(ErrorKind::Io)?;
            file.sync_data().await.map_err(ErrorKind::Io)?;
        } else if !content.is_empty() && !content.ends_with('\n') {
            let mut file = OpenOptions::new().append(true).open(&path).await.map_err(ErrorKind::Io)?;
            file.write_all(b"\n").await.map_err(ErrorKind::Io)?;
            file.sync_data().await.map_err(ErrorKind::Io)?;
        }
        tracing::debug!(entries = entries.len(), "Ledger chain verified");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            #[cfg(test)]
            fail_after_write: std::sync::atomic::AtomicBool::new(false),
        })
    }

    /// Verified entries, and the byte length of the content they came from.
    fn verify(path: &Path, content: &str) -> Result<(Vec<Entry>, usize)> {
        let mut entries: Vec<Entry> = Vec::new();
        let mut previous = Digest::ZERO;
        let mut offset = 0;
        for (index, segment) in content.split_inclusive('\n').enumerate() {
            let start = offset;
            offset += segment.len();
            let line = segment.trim();
            if line.is_empty() {
                continue;
            }
            let entry: Entry = match serde_json::from_str(line) {
                Ok(entry) => entry,
                Err(_) if !segment.ends_with('\n') => return Ok((entries, start)),
                Err(e) => {
                    return Err(e).or_raise(|| ErrorKind::Corrupt {
                        path: path.to_path_buf(),
                        line: index + 1,
                    });
                },
            };
            let sequence = entries.len() as u64 + 1;
            if entry.sequence != sequence || entry.previous != previous || entry.chain != entry.digest.chained(&previous) {
                tracing::error!(path = %path.display(), sequence, "Ledger chain is broken");
                exn::bail!(ErrorKind::Tampered { sequence });
            }
            previous = entry.chain;
            entries.push(entry);
        }
        Ok((entries, offset))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every entry, oldest first.
    pub async fn entries(&self) -> Vec<Entry> {
        self.entries.lock().await.clone()
    }

    /// Append `entry` as one line. On failure the file is cut back to its
    /// previous length, so an unacknowledged entry never stays behind.
    async fn persist(&self, entry: &Entry) -> Result<()> {
        let mut line = serde_json::to_string(entry).map_err(|e| ErrorKind::Io(e.into()))?;
        line.push('\n');
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(ErrorKind::Io)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await.map_err(ErrorKind::Io)?;
        let before = file.metadata().await.map_err(ErrorKind::Io)?.len();
        let written = self.write_line(&mut file, line.as_bytes()).await;
        if let Err(e) = written {
            if let Err(rollback) = file.set_len(before).await {
                tracing::error!(path = %self.path.display(), error = %rollback, "Unable to roll back a failed ledger append");
            }
            exn::bail!(ErrorKind::Io(e));
        }
        Ok(())
    }

    async fn write_line(&self, file: &mut File, line: &[u8]) -> std::io::Result<()> {
        file.write_all(line).await?;
        #[cfg(test)]
        if self.fail_after_write.swap(false, std::sync::atomic::Ordering::SeqCst) {
            return Err(std::io::Error::other("injected sync failure"));
        }
        file.sync_data().await
    }
}

#[async_trait]
impl Ledger for FileLedger {
    async fn append(&self, digest: Digest) -> Result<u64> {
        // Held across the write so concurrent appends cannot fork the chain.
        let mut entries = self.entries.lock().await;
        let previous = entries.last().map_or(Digest::ZERO, |entry| entry.chain);
        let entry = Entry {
            sequence: entries.len() as u64 + 1,
            digest,
            previous,
            chain: digest.chained(&previous),
            anchored_at: OffsetDateTime::now_utc(),
        };
        self.persist(&entry).await?;
        tracing::info!(path = %self.path.display(), sequence = entry.sequence, %digest, "Anchored digest");
        let sequence = entry.sequence;
        entries.push(entry);
        Ok(sequence)
    }

    async fn contains(&self, digest: &Digest) -> Result<bool> {
        Ok(self.entries.lock().await.iter().any(|entry| &entry.digest == digest))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.lock().await.len() as u64)
    }

    async fn latest(&self) -> Result<Option<Digest>> {
        Ok(self.entries.lock().await.last().map(|entry| entry.digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ledger_with(temp_dir: &tempfile::TempDir, contents: &[&[u8]]) -> FileLedger {
        let ledger = FileLedger::open(temp_dir.path().join("ledger.jsonl")).await.unwrap();
        for content in contents {
            ledger.append(Digest::of(content)).await.unwrap();
        }
        ledger
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger = FileLedger::open(temp_dir.path().join("nested/ledger.jsonl")).await.unwrap();
        assert_eq!(ledger.count().await.unwrap(), 0);
        assert_eq!(ledger.latest().await.unwrap(), None);
        ledger.append(Digest::of(b"a")).await.unwrap();
        assert!(temp_dir.path().join("nested/ledger.jsonl").exists());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with(&temp_dir, &[b"first", b"second"]).await;
        assert_eq!(ledger.append(Digest::of(b"third")).await.unwrap(), 3);
        drop(ledger);

        let reopened = FileLedger::open(temp_dir.path().join("ledger.jsonl")).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 3);
        assert_eq!(reopened.latest().await.unwrap(), Some(Digest::of(b"third")));
        assert!(reopened.contains(&Digest::of(b"first")).await.unwrap());
        assert!(!reopened.contains(&Digest::of(b"fourth")).await.unwrap());
        let entries = reopened.entries().await;
        assert_eq!(entries[0].previous, Digest::ZERO);
        assert_eq!(entries[1].previous, entries[0].chain);
    }

    #[tokio::test]
    async fn test_edited_entry_is_tampered() {
        let temp_dir = tempfile::tempdir().unwrap();
        drop(ledger_with(&temp_dir, &[b"first", b"second"]).await);
        let path = temp_dir.path().join("ledger.jsonl");
        let content = std::fs::read_to_string(&path).unwrap();
        let forged = content.replace(&Digest::of(b"first").to_string(), &Digest::of(b"forged").to_string());
        std::fs::write(&path, forged).unwrap();

        let err = FileLedger::open(&path).await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::Tampered { sequence: 1 }));
    }

    #[tokio::test]
    async fn test_removed_entry_is_tampered() {
        let temp_dir = tempfile::tempdir().unwrap();
        drop(ledger_with(&temp_dir, &[b"first", b"second", b"third"]).await);
        let path = temp_dir.path().join("ledger.jsonl");
        let content = std::fs::read_to_string(&path).unwrap();
        let without_second: Vec<&str> = content.lines().enumerate().filter(|(i, _)| *i != 1).map(|(_, l)| l).collect();
        std::fs::write(&path, without_second.join("\n")).unwrap();

        let err = FileLedger::open(&path).await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::Tampered { sequence: 2 }));
    }

    #[tokio::test]
    async fn test_garbage_line_is_corrupt() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ledger.jsonl");
        std::fs::write(&path, "not a ledger entry\n").unwrap();
        let err = FileLedger::open(&path).await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::Corrupt { line: 1, .. }));
    }

    #[tokio::test]
    async fn test_torn_final_line_is_discarded() {
        let temp_dir = tempfile::tempdir().unwrap();
        drop(ledger_with(&temp_dir, &[b"first", b"second"]).await);
        let path = temp_dir.path().join("ledger.jsonl");
        let content = std::fs::read(&path).unwrap();
        std::fs::write(&path, &content[..content.len() - 40]).unwrap();

        let reopened = FileLedger::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        assert!(!reopened.contains(&Digest::of(b"second")).await.unwrap());
        let first_line = content.iter().position(|b| *b == b'\n').unwrap() + 1;
        assert_eq!(std::fs::read(&path).unwrap(), &content[..first_line]);

        assert_eq!(reopened.append(Digest::of(b"second")).await.unwrap(), 2);
        drop(reopened);
        assert_eq!(FileLedger::open(&path).await.unwrap().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_complete_final_line_without_newline_is_kept() {
        let temp_dir = tempfile::tempdir().unwrap();
        drop(ledger_with(&temp_dir, &[b"first", b"second"]).await);
        let path = temp_dir.path().join("ledger.jsonl");
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, content.trim_end()).unwrap();

        let reopened = FileLedger::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
        assert_eq!(reopened.append(Digest::of(b"third")).await.unwrap(), 3);
        drop(reopened);
        assert_eq!(FileLedger::open(&path).await.unwrap().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_append_is_rolled_back() {
        let temp_dir = tempfile::tempdir().unwrap();
        let ledger = ledger_with(&temp_dir, &[b"first", b"second"]).await;
        let path = temp_dir.path().join("ledger.jsonl");
        let before = std::fs::read(&path).unwrap();

        ledger.fail_after_write.store(true, std::sync::atomic::Ordering::SeqCst);
        let err = ledger.append(Digest::of(b"lost")).await.err().unwrap();
        assert!(matches!(&*err, ErrorKind::Io(_)));
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert!(!ledger.contains(&Digest::of(b"lost")).await.unwrap());

        assert_eq!(ledger.append(Digest::of(b"third")).await.unwrap(), 3);
        drop(ledger);
        let reopened = FileLedger::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 3);
        assert_eq!(reopened.latest().await.unwrap(), Some(Digest::of(b"third")));
    }
}
