//! Dataset storage: one JSONL manifest for a whole image directory.
//!
//! `<root>/annotations.jsonl` holds one line per image:
//!
//! ```json
//! {"image": "cars/001.jpg", "objects": [{"rect": [10, 10, 50, 40], "color": "red"}]}
//! ```
//!
//! Saving one image rewrites the manifest with that entry replaced (or
//! appended), keeping every other line as it was.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::atomic::write_atomic;
use super::error::PersistenceError;
use super::key::ImageKey;
use super::record::{ObjectRecord, objects_to_records, records_to_objects};
use super::traits::AnnotationStore;
use crate::constants::DATASET_MANIFEST_NAME;
use crate::model::AnnotatedObject;

/// A full manifest line.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestEntry {
    image: String,
    #[serde(default)]
    objects: Vec<ObjectRecord>,
}

/// Only the image name, so unrelated lines are never re-serialized.
#[derive(Debug, Deserialize)]
struct EntryHeader {
    image: String,
}

/// Dataset manifest backend.
///
/// Keys must be [`ImageKey::Dataset`] under this store's root.
#[derive(Debug, Clone)]
pub struct DatasetStore {
    root: PathBuf,
}

impl DatasetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(DATASET_MANIFEST_NAME)
    }

    /// Key for an image relative to this dataset.
    pub fn key(&self, relative: impl Into<PathBuf>) -> ImageKey {
        ImageKey::dataset(self.root.clone(), relative)
    }

    /// Manifest name of `image`, after checking it belongs here.
    fn entry_name(&self, image: &ImageKey) -> Result<String, PersistenceError> {
        image.validate()?;
        match image {
            ImageKey::Dataset { root, relative } if *root == self.root => {
                Ok(ImageKey::manifest_name(relative))
            }
            ImageKey::Dataset { .. } => Err(PersistenceError::invalid_identifier(
                image.to_string(),
                format!("not part of dataset {}", self.root.display()),
            )),
            ImageKey::Path(_) => Err(PersistenceError::invalid_identifier(
                image.to_string(),
                "dataset store needs a path relative to the dataset root",
            )),
        }
    }

    /// Manifest lines, or none if the manifest does not exist yet.
    fn read_lines(&self) -> Result<Vec<String>, PersistenceError> {
        let path = self.manifest_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&path)?;
        Ok(contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    fn malformed(&self, line: usize, error: impl std::fmt::Display) -> PersistenceError {
        PersistenceError::MalformedManifest {
            path: self.manifest_path(),
            line,
            message: error.to_string(),
        }
    }
}

impl AnnotationStore for DatasetStore {
    fn id(&self) -> &'static str {
        "dataset"
    }

    fn display_name(&self) -> &'static str {
        "Dataset manifest (JSONL)"
    }

    fn load(&self, image: &ImageKey) -> Result<Vec<AnnotatedObject>, PersistenceError> {
        let name = self.entry_name(image)?;

        // Last entry wins if an image appears twice
        let mut found = None;
        for (i, line) in self.read_lines()?.iter().enumerate() {
            let header: EntryHeader =
                serde_json::from_str(line).map_err(|e| self.malformed(i + 1, e))?;
            if header.image == name {
                let entry: ManifestEntry =
                    serde_json::from_str(line).map_err(|e| self.malformed(i + 1, e))?;
                found = Some(entry);
            }
        }

        match found {
            Some(entry) => {
                let objects = records_to_objects(entry.objects, &name)?;
                log::debug!("Loaded {} objects for '{}' from manifest", objects.len(), name);
                Ok(objects)
            }
            None => {
                log::debug!("No manifest entry for '{}', starting empty", name);
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, image: &ImageKey, objects: &[AnnotatedObject]) -> Result<(), PersistenceError> {
        let name = self.entry_name(image)?;
        let entry = ManifestEntry {
            image: name.clone(),
            objects: objects_to_records(objects),
        };
        let new_line = serde_json::to_string(&entry)?;

        let mut lines = Vec::new();
        let mut replaced = false;
        for (i, line) in self.read_lines()?.into_iter().enumerate() {
            let header: EntryHeader =
                serde_json::from_str(&line).map_err(|e| self.malformed(i + 1, e))?;
            if header.image == name {
                // Collapse duplicates into the single new entry
                if !replaced {
                    lines.push(new_line.clone());
                    replaced = true;
                }
            } else {
                lines.push(line);
            }
        }
        if !replaced {
            lines.push(new_line);
        }

        fs::create_dir_all(&self.root)?;
        let mut contents = lines.join("\n");
        contents.push('\n');
        write_atomic(&self.manifest_path(), contents.as_bytes())?;

        log::info!(
            "Saved {} objects for '{}' to {:?}",
            objects.len(),
            name,
            self.manifest_path()
        );
        Ok(())
    }
}
