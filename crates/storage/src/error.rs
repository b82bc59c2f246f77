//! Errors from pod backends.
//!
//! Every backend maps its own failures (filesystem, HTTP status codes) onto
//! [`ErrorKind`], so callers decide about retries without knowing which
//! backend they talk to.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong with a pod operation, from the caller's point of view.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No resource at this path
    #[display("item not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Refused by the pod (missing or rejected token) or the filesystem
    #[display("permission denied: {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    /// Folder creation raced with another creator
    #[display("item already exists: {}", _0.display())]
    AlreadyExists(#[error(not(source))] PathBuf),
    /// Underlying I/O error
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// Pod unreachable or timed out
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Path escapes the pod root or is empty
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// Backend-specific error (unexpected status codes, malformed listings)
    #[display("backend error: {_0}")]
    BackendError(#[error(not(source))] String),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Network(_) | Self::BackendError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_retryable() {
        assert!(ErrorKind::Network("connection refused".to_string()).is_retryable());
        assert!(ErrorKind::BackendError("502 Bad Gateway".to_string()).is_retryable());
        assert!(!ErrorKind::NotFound(PathBuf::from("a.csv")).is_retryable());
        assert!(!ErrorKind::InvalidPath(PathBuf::from("../a.csv")).is_retryable());
    }

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::NotFound(PathBuf::from("aqm1/2022-03-21.csv")).to_string(), "item not found: aqm1/2022-03-21.csv");
    }
}
