//! Trait definition for object list storage backends.

use super::error::PersistenceError;
use super::key::ImageKey;
use crate::model::AnnotatedObject;

/// Save and load the full object list of one image.
///
/// Both backends (per-image sidecar files and the dataset manifest)
/// implement this trait so the editor stays backend-agnostic. A save always
/// replaces the previous list for that image; it never merges.
pub trait AnnotationStore: Send + Sync {
    /// Unique identifier for this backend (e.g., "sidecar", "dataset").
    fn id(&self) -> &'static str;

    /// Human-readable name for UI display.
    fn display_name(&self) -> &'static str;

    /// Load the object list for `image`; an image with no stored list
    /// yields an empty list.
    fn load(&self, image: &ImageKey) -> Result<Vec<AnnotatedObject>, PersistenceError>;

    /// Replace the stored object list for `image` with `objects`.
    fn save(&self, image: &ImageKey, objects: &[AnnotatedObject]) -> Result<(), PersistenceError>;
}
