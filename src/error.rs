//! Error types for the synchronization core.

use crate::types::RecordId;
use thiserror::Error;

/// Main error type for board operations.
///
/// The taxonomy is deliberately small. Validation failures are raised before
/// anything is submitted to the backing store; `NotFound` and `AlreadyClaimed`
/// are surfaced to the caller rather than retried; transient I/O failures are
/// safe to retry at the caller's discretion (the core never retries on its
/// own).
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("validation failed for field `{field}`: {reason}")]
    Validation { field: String, reason: String },

    #[error("record not found: {0}")]
    NotFound(RecordId),

    #[error("item already claimed by {held_by}")]
    AlreadyClaimed { held_by: String },

    #[error("transient I/O failure: {0}")]
    TransientIo(String),
}

impl SyncError {
    /// Shorthand for a missing-required-field validation error.
    pub fn missing_field(field: &str) -> Self {
        SyncError::Validation {
            field: field.to_string(),
            reason: "required field is missing".to_string(),
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(e: std::io::Error) -> Self {
        SyncError::TransientIo(e.to_string())
    }
}

/// Result type for board operations.
pub type Result<T> = std::result::Result<T, SyncError>;
