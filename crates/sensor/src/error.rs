//! Sensor Error Types

use derive_more::{Display, Error};

/// A sensor error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for sensor operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The device could not be reached, or answered with a failure status
    #[display("sensor unreachable: {_0}")]
    Unreachable(#[error(not(source))] String),
    /// The device answered with something that is not a flat property set of numbers
    #[display("invalid sensor response: {_0}")]
    InvalidResponse(#[error(not(source))] String),
    /// The response carries a different set of channels than the run started with
    #[display("channel mismatch: expected [{expected}], found [{found}]")]
    ChannelMismatch {
        #[error(not(source))]
        expected: String,
        #[error(not(source))]
        found: String,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}
