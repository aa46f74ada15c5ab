//! bbox_review - bounding-box annotation editor core
//!
//! Edits the rectangular object annotations of one image at a time: boxes
//! are converted from image pixels into resolution-independent percent
//! space, manipulated there by pointer interactions on a letterboxed
//! display, and written back as rounded pixels to a per-image sidecar file
//! or a dataset-wide manifest.
//!
//! The entry point is [`AnnotationEditor`].

pub mod config;
pub mod constants;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod model;
pub mod overlay;
pub mod persist;
pub mod session;

pub use config::EditorConfig;
pub use editor::{AnnotationEditor, CommitStatus, EditorEvent, ExitOutcome, InputCapture, PointerAction};
pub use error::{EditorError, Result};
pub use model::{AnnotatedObject, Direction, ImageRenderContext, PercentRect, PixelRect};
pub use overlay::OverlayPositioner;
pub use persist::{AnnotationStore, DatasetStore, ImageKey, PersistenceError, SidecarStore};
pub use session::{EditSession, ResizeHandle, SessionId};
