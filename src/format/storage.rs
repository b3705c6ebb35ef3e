//! Storage targets and loading of previously saved annotations.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};
use crate::format::error::FormatError;
use crate::format::formats::{CocoFormat, NativeJsonFormat};
use crate::format::traits::AnnotationFormat;
use crate::model::ImageAnnotations;

/// A persistence format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Native JSON, keeps everything
    Json,
    /// COCO detection JSON, keeps only boxes
    Coco,
}

impl StorageType {
    /// Codec for this format.
    pub fn format(self) -> &'static dyn AnnotationFormat {
        match self {
            StorageType::Json => &NativeJsonFormat,
            StorageType::Coco => &CocoFormat,
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.format().id())
    }
}

/// How often the writer serializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageFrequency {
    /// Write after every mutation
    #[default]
    EveryOperation,
    /// Write after every `n`th mutation
    EveryNOperations(u32),
}

/// Where and how often annotations are persisted.
///
/// An empty `formats` list means nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStorage {
    /// Formats to write
    pub formats: Vec<StorageType>,
    /// Target of the native JSON format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<PathBuf>,
    /// Target of the COCO format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coco_path: Option<PathBuf>,
    /// Write gating
    pub frequency: StorageFrequency,
}

impl AnnotationStorage {
    /// Storage that persists nothing.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add the native JSON target.
    pub fn with_json(mut self, path: impl Into<PathBuf>) -> Self {
        if !self.formats.contains(&StorageType::Json) {
            self.formats.push(StorageType::Json);
        }
        self.json_path = Some(path.into());
        self
    }

    /// Add the COCO target.
    pub fn with_coco(mut self, path: impl Into<PathBuf>) -> Self {
        if !self.formats.contains(&StorageType::Coco) {
            self.formats.push(StorageType::Coco);
        }
        self.coco_path = Some(path.into());
        self
    }

    /// Set the write frequency.
    pub fn with_frequency(mut self, frequency: StorageFrequency) -> Self {
        self.frequency = frequency;
        self
    }

    /// Whether anything is persisted.
    pub fn is_enabled(&self) -> bool {
        !self.formats.is_empty()
    }

    /// Target path of a format, if configured.
    pub fn path_for(&self, storage_type: StorageType) -> Option<&Path> {
        match storage_type {
            StorageType::Json => self.json_path.as_deref(),
            StorageType::Coco => self.coco_path.as_deref(),
        }
    }

    /// Check that every listed format has a usable target.
    pub fn validate(&self) -> Result<()> {
        for &storage_type in &self.formats {
            if self.path_for(storage_type).is_none() {
                return Err(AnnotateError::config(format!(
                    "storage format '{}' has no path",
                    storage_type
                )));
            }
        }

        if let Some(path) = &self.coco_path {
            let is_json = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            if !is_json {
                return Err(AnnotateError::config(format!(
                    "COCO path {:?} must end in .json",
                    path
                )));
            }
        }

        if self.frequency == StorageFrequency::EveryNOperations(0) {
            return Err(AnnotateError::config(
                "every_n_operations must be at least 1",
            ));
        }

        Ok(())
    }

    /// Configured targets in load preference order: lossless formats first.
    pub(crate) fn targets(&self) -> Vec<(StorageType, &Path)> {
        let mut targets: Vec<(StorageType, &Path)> = self
            .formats
            .iter()
            .filter_map(|&t| self.path_for(t).map(|p| (t, p)))
            .collect();
        targets.sort_by_key(|(t, _)| !t.format().is_lossless());
        targets.dedup_by_key(|(t, _)| *t);
        targets
    }
}

/// Load previously saved annotations, if any.
///
/// Tries the configured targets with the native JSON format first. A target
/// that does not exist yet is skipped; `Ok(None)` means no target exists and
/// the session starts fresh. A target that exists but cannot be parsed is
/// an error.
pub fn load_from_storage(
    storage: &AnnotationStorage,
) -> std::result::Result<Option<ImageAnnotations>, FormatError> {
    for (storage_type, path) in storage.targets() {
        if !path.exists() {
            log::debug!("No {} annotations at {:?}", storage_type, path);
            continue;
        }
        let data = storage_type.format().import(path)?;
        log::info!(
            "Resuming from {} annotations at {:?} ({} images)",
            storage_type,
            path,
            data.len()
        );
        return Ok(Some(data));
    }

    log::info!("No existing annotations found, starting fresh");
    Ok(None)
}
