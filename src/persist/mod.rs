//! Object list persistence.
//!
//! Two backends implement [`AnnotationStore`]:
//! - [`SidecarStore`]: `image.json` next to every image
//! - [`DatasetStore`]: one `annotations.jsonl` manifest for a directory
//!
//! [`SaveWorker`] runs saves on a background thread.

mod atomic;
mod dataset;
mod error;
mod key;
mod record;
mod save_worker;
mod sidecar;
mod traits;

#[cfg(test)]
mod tests;

pub use dataset::DatasetStore;
pub use error::PersistenceError;
pub use key::ImageKey;
pub use record::{ObjectRecord, objects_from_json, objects_to_records, records_to_objects};
pub use save_worker::{SaveResult, SaveWorker};
pub use sidecar::SidecarStore;
pub use traits::AnnotationStore;
