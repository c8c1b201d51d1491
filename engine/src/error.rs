//! Error types for the quotesync engine.

use thiserror::Error;

/// Which quote field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Text,
    Category,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Text => f.write_str("text"),
            Field::Category => f.write_str("category"),
        }
    }
}

/// All possible errors from the quotesync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Per-record errors
    #[error("validation failed: {0} must not be empty")]
    Validation(Field),

    // Whole-operation errors
    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("malformed import payload: {0}")]
    MalformedImportPayload(String),

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    // State errors
    #[error("index {index} out of bounds for collection of {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

impl Error {
    /// Whether the error only concerns a single record and can be skipped.
    pub fn is_per_record(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
