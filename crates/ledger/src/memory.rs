use crate::error::{ErrorKind, Result};
use crate::{Digest, Ledger};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory ledger; forgets everything when dropped.
///
/// Like the mock storage backend it can be told to refuse the next few
/// appends, which is how an unreachable ledger looks to callers.
#[derive(Default)]
pub struct MemoryLedger {
    digests: RwLock<Vec<Digest>>,
    failures: AtomicUsize,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` appends fail.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Every anchored digest, oldest first.
    pub async fn digests(&self) -> Vec<Digest> {
        self.digests.read().await.clone()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn append(&self, digest: Digest) -> Result<u64> {
        if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
            exn::bail!(ErrorKind::Unavailable);
        }
        let mut digests = self.digests.write().await;
        digests.push(digest);
        Ok(digests.len() as u64)
    }

    async fn contains(&self, digest: &Digest) -> Result<bool> {
        Ok(self.digests.read().await.contains(digest))
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.digests.read().await.len() as u64)
    }

    async fn latest(&self) -> Result<Option<Digest>> {
        Ok(self.digests.read().await.last().copied())
    }
}
