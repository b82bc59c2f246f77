//! Append-only, tamper-evident ledger of file digests.
//!
//! A ledger only ever learns a [`Digest`]; which file it belonged to is not
//! recorded. Verification is therefore "has anyone ever anchored exactly these
//! bytes?", answered by [`Ledger::contains`].

mod digest;
pub mod error;
mod file;
mod memory;

pub use crate::digest::Digest;
pub use crate::file::{Entry, FileLedger};
pub use crate::memory::MemoryLedger;
use async_trait::async_trait;
use error::Result;
use std::sync::Arc;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Anchor a digest, returning its 1-based sequence number.
    async fn append(&self, digest: Digest) -> Result<u64>;

    /// Whether the digest has ever been anchored.
    async fn contains(&self, digest: &Digest) -> Result<bool>;

    /// Number of anchored digests.
    async fn count(&self) -> Result<u64>;

    /// Most recently anchored digest, if any.
    async fn latest(&self) -> Result<Option<Digest>>;
}

pub type LedgerHandle = Arc<dyn Ledger + Send + Sync>;
