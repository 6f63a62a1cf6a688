use crate::repository::LookupKind;
use thiserror::Error;

/// Errors raised by relation store backends.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("relation already exists: {0}")]
    Conflict(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

/// Errors returned by the shortener operations.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    /// No relation matches the requested key. Expected and recoverable.
    #[error("Non-existent {0}")]
    NotFound(LookupKind),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    /// A duplicate identifier showed up where absence had been established.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("no free short code found after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl ShortenerError {
    /// Returns `true` for the expected "no such relation" outcome.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShortenerError::NotFound(_))
    }
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::Conflict(message) => Self::InvariantViolation(message),
            other => Self::Storage(other),
        }
    }
}
