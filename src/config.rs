//! Session configuration file.
//!
//! A session is described by one JSON file naming the label catalog, the
//! images, where annotations are stored, and the annotation options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::controller::AnnotateOptions;
use crate::data::{ImageSource, LabelSource};
use crate::format::AnnotationStorage;

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

/// What the session annotates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationMode {
    /// One classification label per image
    #[default]
    ImageLabels,
    /// Bounding boxes
    Bboxes,
}

/// File-backed image sources that a configuration file can name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSourceConfig {
    /// Files in a folder matching a glob pattern
    Folder {
        /// Folder to list
        folder: PathBuf,
        /// File name pattern
        #[serde(default = "default_pattern")]
        pattern: String,
    },
    /// An explicit list of files
    Files {
        /// Files in annotation order
        files: Vec<PathBuf>,
    },
}

fn default_pattern() -> String {
    ImageSource::DEFAULT_PATTERN.to_string()
}

impl ImageSourceConfig {
    /// Build the image source.
    pub fn to_source(&self) -> ImageSource {
        match self {
            ImageSourceConfig::Folder { folder, pattern } => {
                ImageSource::folder(folder.clone(), pattern.clone())
            }
            ImageSourceConfig::Files { files } => ImageSource::files(files.iter().cloned()),
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

fn default_version() -> u32 {
    CONFIG_VERSION
}

/// A complete annotation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Version of the configuration file format
    #[serde(default = "default_version")]
    pub version: u32,

    /// Labels or boxes
    #[serde(default)]
    pub mode: AnnotationMode,

    /// Label catalog
    pub label_source: LabelSource,

    /// Images to annotate
    pub image_source: ImageSourceConfig,

    /// Where annotations are written
    #[serde(default)]
    pub storage: AnnotationStorage,

    /// Annotation options
    #[serde(default)]
    pub options: AnnotateOptions,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl SessionConfig {
    /// Create a configuration with default settings.
    pub fn new(label_source: LabelSource, image_source: ImageSourceConfig) -> Self {
        Self {
            version: CONFIG_VERSION,
            mode: AnnotationMode::default(),
            label_source,
            image_source,
            storage: AnnotationStorage::default(),
            options: AnnotateOptions::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize and validate configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Check settings that deserialization alone does not catch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.image_source
            .to_source()
            .validate()
            .and_then(|()| self.storage.validate())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        /// Version in the file
        file_version: u32,
        /// Newest version this build reads
        supported_version: u32,
    },

    /// I/O error when reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings are inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{StorageFrequency, StorageType};
    use crate::model::SelectionMode;

    const FULL: &str = r#"{
        "version": 1,
        "mode": "bboxes",
        "label_source": {"type": "inline", "labels": ["cat", "dog"]},
        "image_source": {"type": "folder", "folder": "images", "pattern": "*.png"},
        "storage": {
            "formats": ["json", "coco"],
            "json_path": "out/annotations.json",
            "coco_path": "out/coco.json",
            "frequency": {"every_n_operations": 10}
        },
        "options": {"selection_mode": "multiple", "store_history": false, "author": "ann"},
        "log_level": "debug"
    }"#;

    #[test]
    fn test_full_config() {
        let config = SessionConfig::from_json(FULL).unwrap();
        assert_eq!(config.mode, AnnotationMode::Bboxes);
        assert_eq!(config.label_source, LabelSource::inline(["cat", "dog"]));
        assert_eq!(
            config.image_source,
            ImageSourceConfig::Folder {
                folder: PathBuf::from("images"),
                pattern: "*.png".to_string()
            }
        );
        assert_eq!(
            config.storage.formats,
            vec![StorageType::Json, StorageType::Coco]
        );
        assert_eq!(
            config.storage.frequency,
            StorageFrequency::EveryNOperations(10)
        );
        assert_eq!(config.options.selection_mode, SelectionMode::Multiple);
        assert!(!config.options.store_history);
        assert!(config.options.store_timestamps);
        assert_eq!(config.options.author.as_deref(), Some("ann"));
        assert_eq!(config.log_level.to_level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let json = r#"{
            "label_source": {"type": "text_file", "path": "labels.txt"},
            "image_source": {"type": "folder", "folder": "images"}
        }"#;
        let config = SessionConfig::from_json(json).unwrap();
        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.mode, AnnotationMode::ImageLabels);
        assert!(!config.storage.is_enabled());
        assert_eq!(config.options, AnnotateOptions::default());
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(matches!(
            config.image_source,
            ImageSourceConfig::Folder { ref pattern, .. } if pattern == "*.jpg"
        ));
    }

    #[test]
    fn test_roundtrip_json() {
        let config = SessionConfig::new(
            LabelSource::inline(["a"]),
            ImageSourceConfig::Files {
                files: vec![PathBuf::from("x.png")],
            },
        );
        let json = config.to_json().unwrap();
        assert_eq!(SessionConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_version_too_new() {
        let json = r#"{
            "version": 99,
            "label_source": {"type": "inline", "labels": []},
            "image_source": {"type": "files", "files": []}
        }"#;
        assert!(matches!(
            SessionConfig::from_json(json),
            Err(ConfigError::VersionTooNew {
                file_version: 99,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_storage() {
        let json = r#"{
            "label_source": {"type": "inline", "labels": []},
            "image_source": {"type": "files", "files": []},
            "storage": {"formats": ["coco"]}
        }"#;
        assert!(matches!(
            SessionConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_image_pattern() {
        let json = r#"{
            "label_source": {"type": "inline", "labels": []},
            "image_source": {"type": "folder", "folder": "images", "pattern": "*.[jp"}
        }"#;
        assert!(matches!(
            SessionConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_source_type() {
        let json = r#"{
            "label_source": {"type": "inline", "labels": []},
            "image_source": {"type": "url", "url": "http://x"}
        }"#;
        assert!(matches!(
            SessionConfig::from_json(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, FULL).unwrap();
        assert_eq!(SessionConfig::load(&path).unwrap().mode, AnnotationMode::Bboxes);
        assert!(matches!(
            SessionConfig::load(&dir.path().join("missing.json")),
            Err(ConfigError::Io(_))
        ));
    }
}
