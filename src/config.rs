//! Configuration file support.
//!
//! The config selects the persistence backend and carries a few editor
//! preferences. It lives at `<config_dir>/bbox_review/config.json`; a missing
//! file means defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::constants::{APP_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_HANDLE_HIT_RADIUS_PX};
use crate::persist::{AnnotationStore, DatasetStore, ImageKey, SidecarStore};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Where object lists are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PersistenceMode {
    /// A `.json` sidecar next to every image
    #[default]
    PerImage,
    /// One manifest for every image under `dataset_root`
    Dataset { dataset_root: PathBuf },
}

/// What happens to a live session when the user moves to another image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolvePolicy {
    /// Save the working copy first
    #[default]
    Commit,
    /// Drop the working copy
    Discard,
}

/// User preferences section of the config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Pointer distance (display pixels) that still counts as a handle hit
    #[serde(default = "default_handle_hit_radius")]
    pub handle_hit_radius_px: f64,

    #[serde(default)]
    pub resolve_on_switch: ResolvePolicy,

    /// Run saves on a background thread
    #[serde(default)]
    pub background_saves: bool,
}

fn default_handle_hit_radius() -> f64 {
    DEFAULT_HANDLE_HIT_RADIUS_PX
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            handle_hit_radius_px: default_handle_hit_radius(),
            resolve_on_switch: ResolvePolicy::default(),
            background_saves: false,
        }
    }
}

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Version of the configuration file format
    pub version: u32,

    #[serde(default)]
    pub persistence: PersistenceMode,

    #[serde(default)]
    pub preferences: UserPreferences,
}

impl EditorConfig {
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            persistence: PersistenceMode::default(),
            preferences: UserPreferences::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        if !config.preferences.handle_hit_radius_px.is_finite()
            || config.preferences.handle_hit_radius_px < 0.0
        {
            return Err(ConfigError::Invalid(format!(
                "handle_hit_radius_px must be a non-negative number, got {}",
                config.preferences.handle_hit_radius_px
            )));
        }
        if let PersistenceMode::Dataset { dataset_root } = &config.persistence {
            if dataset_root.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("dataset_root is empty".to_string()));
            }
        }

        Ok(config)
    }

    /// Get the default config file path.
    pub fn default_path() -> Option<PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
        } else {
            dirs::home_dir().map(|home| {
                home.join(".config")
                    .join(APP_DIR_NAME)
                    .join(CONFIG_FILE_NAME)
            })
        }
    }

    /// Load from the default path, falling back to defaults.
    ///
    /// A missing file is normal; an unreadable or invalid one is logged and
    /// ignored.
    pub fn load_from_default_path() -> Self {
        let Some(path) = Self::default_path() else {
            log::debug!("No config directory, using defaults");
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Write the configuration, creating parent directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Persistence backend for the configured mode.
    pub fn build_store(&self) -> Arc<dyn AnnotationStore> {
        match &self.persistence {
            PersistenceMode::PerImage => Arc::new(SidecarStore::new()),
            PersistenceMode::Dataset { dataset_root } => {
                Arc::new(DatasetStore::new(dataset_root.clone()))
            }
        }
    }

    /// Storage key for an image file under the configured mode.
    ///
    /// In dataset mode, a path inside the dataset root is made relative to
    /// it; any other path is used as given and rejected later by the store.
    pub fn image_key(&self, image: &Path) -> ImageKey {
        match &self.persistence {
            PersistenceMode::PerImage => ImageKey::path(image),
            PersistenceMode::Dataset { dataset_root } => {
                let relative = image.strip_prefix(dataset_root).unwrap_or(image);
                ImageKey::dataset(dataset_root.clone(), relative)
            }
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trips() {
        let config = EditorConfig::default();
        let json = config.to_json().expect("serialize");
        assert_eq!(EditorConfig::from_json(&json).expect("parse"), config);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = EditorConfig::from_json(r#"{"version": 1}"#).expect("parse");
        assert_eq!(config.persistence, PersistenceMode::PerImage);
        assert_eq!(config.preferences.resolve_on_switch, ResolvePolicy::Commit);
        assert_eq!(
            config.preferences.handle_hit_radius_px,
            DEFAULT_HANDLE_HIT_RADIUS_PX
        );
        assert!(!config.preferences.background_saves);
    }

    #[test]
    fn test_dataset_mode_parses() {
        let json = r#"{
            "version": 1,
            "persistence": {"mode": "dataset", "dataset_root": "/data/cars"},
            "preferences": {"log_level": "debug", "resolve_on_switch": "discard", "background_saves": true}
        }"#;
        let config = EditorConfig::from_json(json).expect("parse");
        assert_eq!(
            config.persistence,
            PersistenceMode::Dataset {
                dataset_root: PathBuf::from("/data/cars")
            }
        );
        assert_eq!(config.preferences.log_level, LogLevel::Debug);
        assert_eq!(config.preferences.resolve_on_switch, ResolvePolicy::Discard);
        assert!(config.preferences.background_saves);
        assert_eq!(config.build_store().id(), "dataset");
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = EditorConfig::from_json(r#"{"version": 99}"#).unwrap_err();
        assert!(matches!(err, ConfigError::VersionTooNew { file_version: 99, .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let negative = r#"{"version": 1, "preferences": {"handle_hit_radius_px": -1.0}}"#;
        assert!(matches!(
            EditorConfig::from_json(negative),
            Err(ConfigError::Invalid(_))
        ));

        let empty_root = r#"{"version": 1, "persistence": {"mode": "dataset", "dataset_root": ""}}"#;
        assert!(matches!(
            EditorConfig::from_json(empty_root),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_image_key_per_mode() {
        let image = Path::new("/data/cars/sub/001.jpg");

        let per_image = EditorConfig::default();
        assert_eq!(per_image.image_key(image), ImageKey::path(image));
        assert_eq!(per_image.build_store().id(), "sidecar");

        let dataset = EditorConfig {
            persistence: PersistenceMode::Dataset {
                dataset_root: PathBuf::from("/data/cars"),
            },
            ..EditorConfig::default()
        };
        assert_eq!(
            dataset.image_key(image),
            ImageKey::dataset("/data/cars", "sub/001.jpg")
        );
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.json");

        let mut config = EditorConfig::default();
        config.preferences.log_level = LogLevel::Trace;
        config.save_to(&path).expect("save");

        assert_eq!(EditorConfig::load_from(&path).expect("load"), config);
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::default().name(), "Info");
    }
}
