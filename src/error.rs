//! Error types for the annotation editor.

use thiserror::Error;

use crate::persist::PersistenceError;

/// Errors surfaced by the geometry engine, edit session and editor controller.
///
/// Interactive geometry problems (pointer outside the image, a resize that
/// would collapse a box) never reach the caller as errors; they are resolved
/// by clamping or by keeping the previous frame.
#[derive(Error, Debug)]
pub enum EditorError {
    /// Natural image size is zero on at least one axis
    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Natural width in pixels
        width: f64,
        /// Natural height in pixels
        height: f64,
    },

    /// Session operation attempted before render metadata is available
    #[error("No image render context available")]
    NoImageContext,

    /// Operation requires an active edit session
    #[error("No edit session is active")]
    NoSession,

    /// A session for this image is already open
    #[error("An edit session is already active for image '{image}'")]
    SessionActive {
        /// Image the open session belongs to
        image: String,
    },

    /// A commit for the session is still outstanding
    #[error("A commit is still in flight for image '{image}'")]
    CommitInFlight {
        /// Image being saved
        image: String,
    },

    /// Operation requires the session to be idle (no move/resize/draw)
    #[error("Cannot {operation} while an interaction is active")]
    InteractionActive {
        /// Name of the rejected operation
        operation: &'static str,
    },

    /// Operation requires an active interaction
    #[error("No interaction is active")]
    NotInteracting,

    /// Move/resize requested on an object that is not selected
    #[error("Object {requested} is not selected (selected: {selected:?})")]
    SelectionMismatch {
        /// Index passed by the caller
        requested: usize,
        /// Current selection
        selected: Option<usize>,
    },

    /// Operation requires a selected object
    #[error("No object is selected")]
    NothingSelected,

    /// Index does not refer to a working object
    #[error("Object index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of working objects
        len: usize,
    },

    /// Persistence backend failure
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl EditorError {
    /// Create an invalid dimensions error.
    pub fn invalid_dimensions(width: f64, height: f64) -> Self {
        Self::InvalidDimensions { width, height }
    }

    /// Create an index out of range error.
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// Whether the session survives this error and the user can retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::CommitInFlight { .. })
    }
}

/// Result alias used throughout the editor.
pub type Result<T> = std::result::Result<T, EditorError>;
