//! Harvesting sensor readings into a pod, anchoring them, and verifying them.
//!
//! The pipeline is fetch, ensure folders, write, mirror locally, anchor, wait.
//! Two [strategies](strategy) decide how readings map onto pod files and when
//! digests are anchored; the [verifier](verify) later checks stored files
//! against the ledger.

pub mod anchor;
pub mod clock;
mod context;
pub mod document;
pub mod error;
pub mod mirror;
pub mod naming;
pub mod retry;
pub mod schedule;
pub mod strategy;
pub mod verify;

pub use crate::context::{Context, PodLayout};
