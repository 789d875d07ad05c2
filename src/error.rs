//! Error types and handling for async sequences
//!
//! Every failure an enumerator can surface is a [`SeqError`]. Errors are
//! cloneable so a single upstream failure can be replayed to every consumer
//! of a cached or broadcast sequence.

use thiserror::Error;

/// Main error type for sequence operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeqError {
    /// A producer or transform failed
    #[error("upstream failure: {0}")]
    Upstream(String),
    /// I/O related errors
    #[error("IO error: {0}")]
    Io(String),
    /// Operation timed out
    #[error("operation timed out")]
    Timeout,
    /// An operation that needs at least one element found none
    #[error("the sequence was empty")]
    Empty,
    /// Invalid combinator argument (zero buffer size and the like)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A worker pool job panicked or was cancelled
    #[error("worker job failed: {0}")]
    Worker(String),
    /// The enumerator was advanced after it had been disposed
    #[error("enumerator advanced after disposal")]
    Disposed,
    /// Custom error with message
    #[error("sequence error: {0}")]
    Custom(String),
}

impl SeqError {
    /// Shorthand for an upstream failure
    pub fn upstream(msg: impl Into<String>) -> Self {
        SeqError::Upstream(msg.into())
    }

    /// Shorthand for a custom failure
    pub fn custom(msg: impl Into<String>) -> Self {
        SeqError::Custom(msg.into())
    }

    /// True for the "unexpectedly empty" outcome of `first`, `last`, `pick`, ...
    pub fn is_empty_error(&self) -> bool {
        matches!(self, SeqError::Empty)
    }
}

impl From<std::io::Error> for SeqError {
    fn from(err: std::io::Error) -> Self {
        SeqError::Io(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for SeqError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        SeqError::Timeout
    }
}

impl From<tokio::task::JoinError> for SeqError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            SeqError::Worker("job cancelled".to_string())
        } else {
            SeqError::Worker(err.to_string())
        }
    }
}

/// Result type for sequence operations
pub type SeqResult<T> = Result<T, SeqError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert() {
        let err: SeqError = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert_eq!(err, SeqError::Io("disk gone".to_string()));
        assert_eq!(err.to_string(), "IO error: disk gone");
    }

    #[test]
    fn empty_is_distinct_from_other_failures() {
        assert!(SeqError::Empty.is_empty_error());
        assert!(!SeqError::upstream("boom").is_empty_error());
    }
}
