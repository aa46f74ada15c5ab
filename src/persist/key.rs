//! Identifiers for the image an object list belongs to.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use super::error::PersistenceError;

/// Which image an object list is stored for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageKey {
    /// Per-image mode: the image file itself, its sidecar sits next to it
    Path(PathBuf),
    /// Dataset mode: a path relative to the dataset root
    Dataset {
        /// Dataset root directory
        root: PathBuf,
        /// Image path relative to `root`
        relative: PathBuf,
    },
}

impl ImageKey {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn dataset(root: impl Into<PathBuf>, relative: impl Into<PathBuf>) -> Self {
        Self::Dataset {
            root: root.into(),
            relative: relative.into(),
        }
    }

    /// Check that the identifier can be mapped to storage.
    pub fn validate(&self) -> Result<(), PersistenceError> {
        match self {
            ImageKey::Path(path) => {
                if path.as_os_str().is_empty() {
                    return Err(PersistenceError::invalid_identifier(self.to_string(), "empty path"));
                }
                if path.file_name().is_none() {
                    return Err(PersistenceError::invalid_identifier(
                        self.to_string(),
                        "path has no file name",
                    ));
                }
                Ok(())
            }
            ImageKey::Dataset { root, relative } => {
                if root.as_os_str().is_empty() {
                    return Err(PersistenceError::invalid_identifier(
                        self.to_string(),
                        "empty dataset root",
                    ));
                }
                validate_relative(relative)
                    .map_err(|reason| PersistenceError::invalid_identifier(self.to_string(), reason))
            }
        }
    }

    /// Relative path with `/` separators, as stored in the dataset manifest.
    pub fn manifest_name(relative: &Path) -> String {
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn validate_relative(relative: &Path) -> Result<(), &'static str> {
    if relative.as_os_str().is_empty() {
        return Err("empty relative path");
    }
    if relative.has_root() || relative.is_absolute() {
        return Err("path must be relative to the dataset root");
    }
    for component in relative.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err("path must not contain '..'"),
            Component::RootDir | Component::Prefix(_) => {
                return Err("path must be relative to the dataset root");
            }
        }
    }
    if ImageKey::manifest_name(relative).is_empty() {
        return Err("path has no file name");
    }
    Ok(())
}

impl fmt::Display for ImageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKey::Path(path) => write!(f, "{}", path.display()),
            ImageKey::Dataset { root, relative } => {
                write!(f, "{}::{}", root.display(), relative.display())
            }
        }
    }
}
