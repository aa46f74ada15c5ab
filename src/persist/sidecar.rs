//! Per-image storage: a JSON sidecar next to each image.
//!
//! `photos/img_001.jpg` keeps its objects in `photos/img_001.json` as a JSON
//! array of records (see [`super::record`]).

use std::path::{Path, PathBuf};

use super::atomic::write_atomic;
use super::error::PersistenceError;
use super::key::ImageKey;
use super::record::{objects_from_json, objects_to_records};
use super::traits::AnnotationStore;
use crate::constants::SIDECAR_EXTENSION;
use crate::model::AnnotatedObject;

/// Per-image sidecar file backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarStore;

impl SidecarStore {
    pub fn new() -> Self {
        Self
    }

    /// Sidecar file for an image path.
    pub fn sidecar_path(image: &Path) -> PathBuf {
        image.with_extension(SIDECAR_EXTENSION)
    }

    fn image_path<'a>(&self, image: &'a ImageKey) -> Result<&'a Path, PersistenceError> {
        image.validate()?;
        match image {
            ImageKey::Path(path) => Ok(path),
            ImageKey::Dataset { .. } => Err(PersistenceError::invalid_identifier(
                image.to_string(),
                "per-image store needs an image path, not a dataset key",
            )),
        }
    }
}

impl AnnotationStore for SidecarStore {
    fn id(&self) -> &'static str {
        "sidecar"
    }

    fn display_name(&self) -> &'static str {
        "Per-image JSON sidecar"
    }

    fn load(&self, image: &ImageKey) -> Result<Vec<AnnotatedObject>, PersistenceError> {
        let path = Self::sidecar_path(self.image_path(image)?);
        if !path.exists() {
            log::debug!("No sidecar at {:?}, starting empty", path);
            return Ok(Vec::new());
        }

        let json = std::fs::read_to_string(&path)?;
        let objects = objects_from_json(&json, &image.to_string())?;
        log::debug!("Loaded {} objects from {:?}", objects.len(), path);
        Ok(objects)
    }

    fn save(&self, image: &ImageKey, objects: &[AnnotatedObject]) -> Result<(), PersistenceError> {
        let path = Self::sidecar_path(self.image_path(image)?);
        let json = serde_json::to_string_pretty(&objects_to_records(objects))?;
        write_atomic(&path, json.as_bytes())?;
        log::info!("Saved {} objects to {:?}", objects.len(), path);
        Ok(())
    }
}
