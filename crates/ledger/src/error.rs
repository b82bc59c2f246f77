//! Ledger Error Types

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A ledger error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Not a 64 character hexadecimal digest
    #[display("invalid digest: {_0}")]
    InvalidDigest(#[error(not(source))] String),
    /// A ledger line could not be parsed at all
    #[display("corrupt ledger entry on line {line} of {}", path.display())]
    Corrupt {
        #[error(not(source))]
        path: PathBuf,
        #[error(not(source))]
        line: usize,
    },
    /// A ledger entry does not follow from the one before it
    #[display("ledger chain broken at entry {sequence}")]
    Tampered {
        #[error(not(source))]
        sequence: u64,
    },
    /// The ledger refused the operation (used by test doubles)
    #[display("ledger unavailable")]
    Unavailable,
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable)
    }
}
