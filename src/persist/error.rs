//! Error types for object list persistence.

use thiserror::Error;

/// Errors that can occur while loading or saving object lists.
///
/// None of these are fatal to an edit session: a failed save leaves the
/// working copy in place so the user can retry or discard.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The image identifier cannot be mapped to storage
    #[error("Invalid image identifier '{key}': {reason}")]
    InvalidIdentifier {
        /// The rejected identifier
        key: String,
        /// Why it was rejected
        reason: String,
    },

    /// A stored object record could not be interpreted
    #[error("Malformed record {index} for '{image}': {message}")]
    MalformedRecord {
        /// Image the record belongs to
        image: String,
        /// Position of the record in the list
        index: usize,
        /// Description of the problem
        message: String,
    },

    /// A dataset manifest line could not be parsed
    #[error("Malformed manifest line {line} in {path:?}: {message}")]
    MalformedManifest {
        /// Manifest file
        path: std::path::PathBuf,
        /// 1-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// The background save thread is gone
    #[error("Save worker unavailable: {0}")]
    WorkerUnavailable(String),
}

impl PersistenceError {
    /// Create an invalid identifier error.
    pub fn invalid_identifier(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed record error.
    pub fn malformed_record(image: impl Into<String>, index: usize, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            image: image.into(),
            index,
            message: message.into(),
        }
    }

    /// User-facing reason, e.g. for a "changes not saved" notice.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}
