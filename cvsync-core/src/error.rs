//! Error taxonomy shared by the file store, record codec and sync controller.
//!
//! Every failure is surfaced to the caller as one of these variants; nothing
//! in the core retries or silently recovers. `Transient` is the only variant
//! that is safe to retry unchanged.

/// Result type for cvsync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur during load/save of a record collection
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The requested file does not exist in the store
    #[error("file not found: {0}")]
    NotFound(String),

    /// Credentials are missing, invalid or lack permission
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Network or rate-limit failure; safe to retry unchanged
    #[error("transient store failure: {0}")]
    Transient(String),

    /// The version token no longer matches the store's current revision.
    /// Resolved only by reloading and reapplying the change.
    #[error("version token mismatch for {path}: {message}")]
    Conflict { path: String, message: String },

    /// The data file could not be parsed into records. Not retryable
    /// without human correction of the file.
    #[error("parse error in {path}: {message} (near: {excerpt:?})")]
    Parse {
        path: String,
        message: String,
        excerpt: String,
    },

    /// Caller-supplied record or index rejected before any network call
    #[error("invalid record: {0}")]
    Validation(String),
}

impl SyncError {
    /// Whether an identical retry may succeed without any other change.
    pub fn is_transient(&self) -> bool {
        matches!(self, SyncError::Transient(_))
    }

    pub(crate) fn conflict(path: &str, message: impl Into<String>) -> Self {
        SyncError::Conflict {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn parse(path: &str, message: impl Into<String>, excerpt: impl Into<String>) -> Self {
        SyncError::Parse {
            path: path.to_string(),
            message: message.into(),
            excerpt: excerpt.into(),
        }
    }
}
