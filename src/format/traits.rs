//! Trait definitions for annotation format implementations.

use std::path::{Path, PathBuf};

use crate::format::error::FormatError;
use crate::model::ImageAnnotations;

/// Trait for annotation format import/export implementations.
///
/// Each format (native JSON, COCO) implements this trait to convert between
/// the in-memory [`ImageAnnotations`] and its file representation.
pub trait AnnotationFormat: Send + Sync {
    /// Unique identifier for this format (e.g., "json", "coco").
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn display_name(&self) -> &'static str;

    /// File extensions this format uses.
    fn extensions(&self) -> &[&'static str];

    /// Whether a write followed by a read reproduces the records exactly.
    ///
    /// Lossy formats are never preferred for resuming a session when a
    /// lossless one is available.
    fn is_lossless(&self) -> bool;

    /// Serialize records to bytes.
    fn export_to_bytes(
        &self,
        data: &ImageAnnotations,
    ) -> Result<(Vec<u8>, ExportResult), FormatError>;

    /// Parse records from bytes.
    fn import_from_bytes(&self, bytes: &[u8]) -> Result<ImageAnnotations, FormatError>;

    /// Write records to `path`, overwriting it and creating parent
    /// directories as needed.
    fn export(&self, data: &ImageAnnotations, path: &Path) -> Result<ExportResult, FormatError> {
        let (bytes, mut result) = self.export_to_bytes(data)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
                log::debug!("Created directory {:?}", parent);
            }
        }
        std::fs::write(path, &bytes)?;
        result.files_created = vec![path.to_path_buf()];

        log::debug!(
            "Wrote {} to {:?}: {} images, {} boxes",
            self.display_name(),
            path,
            result.images_exported,
            result.annotations_exported
        );
        Ok(result)
    }

    /// Read records from `path`.
    fn import(&self, path: &Path) -> Result<ImageAnnotations, FormatError> {
        log::info!("Importing {} from {:?}", self.display_name(), path);
        let bytes = std::fs::read(path)?;
        let data = self.import_from_bytes(&bytes)?;
        log::info!(
            "Imported {} images with {} boxes",
            data.len(),
            data.total_bboxes()
        );
        Ok(data)
    }
}

/// Result of an export operation.
#[derive(Debug, Default)]
pub struct ExportResult {
    /// Number of images exported.
    pub images_exported: usize,

    /// Number of boxes exported.
    pub annotations_exported: usize,

    /// Warnings generated during export (e.g., skipped records).
    pub warnings: Vec<FormatWarning>,

    /// Files created during export.
    pub files_created: Vec<PathBuf>,
}

impl ExportResult {
    /// Create a new export result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning to the result.
    pub fn add_warning(&mut self, warning: FormatWarning) {
        self.warnings.push(warning);
    }

    /// Check if there were any warnings.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Warning generated during format conversion.
#[derive(Debug, Clone)]
pub struct FormatWarning {
    /// Image this warning relates to (if applicable).
    pub image_name: Option<String>,

    /// Human-readable warning message.
    pub message: String,

    /// Severity level of the warning.
    pub severity: WarningSeverity,
}

impl FormatWarning {
    /// Create a new warning.
    pub fn new(message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            image_name: None,
            message: message.into(),
            severity,
        }
    }

    /// Create an info-level warning.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Info)
    }

    /// Create a warning-level warning.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Warning)
    }

    /// Set the image this warning relates to.
    pub fn with_image(mut self, image_name: impl Into<String>) -> Self {
        self.image_name = Some(image_name.into());
        self
    }
}

/// Severity level for format warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    /// Informational message, not a problem.
    Info,
    /// Something was skipped or modified.
    Warning,
}
