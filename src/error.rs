//! Error types for the lexis crate.

use thiserror::Error;

/// The error type for all fallible lexis operations.
#[derive(Debug, Error)]
pub enum LexisError {
    /// An I/O error from the underlying file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A caller supplied a value that cannot be stored.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The configuration is unusable or disagrees with the file on disk.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The operation is not allowed in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A sequential read went past the last record.
    #[error("read out of range: position {position} exceeds length {len}")]
    OutOfRange { position: usize, len: usize },

    /// A sequential read was attempted without an active mapping.
    #[error("memory mapping is not enabled")]
    NotMapped,

    /// A record could not be decoded.
    #[error("corrupted record: {0}")]
    Corrupted(String),

    /// An internal invariant was violated.
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LexisError {
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        LexisError::InvalidArgument(msg.into())
    }

    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        LexisError::InvalidConfig(msg.into())
    }

    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        LexisError::InvalidOperation(msg.into())
    }

    pub fn corrupted<S: Into<String>>(msg: S) -> Self {
        LexisError::Corrupted(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        LexisError::Internal(msg.into())
    }

    /// Whether this error marks the end of a sequential scan.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, LexisError::OutOfRange { .. })
    }
}

/// Result type alias for lexis operations.
pub type Result<T> = std::result::Result<T, LexisError>;
