//! Harvest Error Types

use derive_more::{Display, Error};
use std::io::Error as IoError;

/// A harvest error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for harvest operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("issue with the sensor")]
    Sensor,
    #[display("issue with pod storage")]
    Storage,
    #[display("issue with the ledger")]
    Ledger,
    /// Local mirror could not be written, read or removed
    #[display("local mirror I/O error: {_0}")]
    Mirror(IoError),
    /// A file name that cannot be used as a single local file name
    #[display("unusable file name: {_0}")]
    InvalidName(#[error(not(source))] String),
    /// An operation kept failing until its attempt budget ran out
    #[display("unable to {purpose} after {attempts} attempts")]
    RetriesExhausted {
        #[error(not(source))]
        purpose: String,
        #[error(not(source))]
        attempts: u32,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Mirror(_))
    }

    /// Whether the harvest loop must stop, rather than skip the current cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }
}
