//! Native JSON format implementation.
//!
//! Serializes the record set as-is:
//!
//! ```json
//! {"image_to_entry": {"<image>": {"image_name": "<image>", "label": {...}, "bboxs": [...], ...}}}
//! ```
//!
//! Empty and absent fields are omitted. This is the only format that keeps
//! labels and history, so it is the preferred source when resuming.

use crate::format::error::FormatError;
use crate::format::traits::{AnnotationFormat, ExportResult};
use crate::model::ImageAnnotations;

/// Native JSON format with full fidelity.
pub struct NativeJsonFormat;

impl AnnotationFormat for NativeJsonFormat {
    fn id(&self) -> &'static str {
        "json"
    }

    fn display_name(&self) -> &'static str {
        "Annotations (JSON)"
    }

    fn extensions(&self) -> &[&'static str] {
        &["json"]
    }

    fn is_lossless(&self) -> bool {
        true
    }

    fn export_to_bytes(
        &self,
        data: &ImageAnnotations,
    ) -> Result<(Vec<u8>, ExportResult), FormatError> {
        // Serialize with pretty printing for readability
        let json = serde_json::to_string_pretty(data)?;

        Ok((
            json.into_bytes(),
            ExportResult {
                images_exported: data.len(),
                annotations_exported: data.total_bboxes(),
                warnings: Vec::new(),
                files_created: Vec::new(),
            },
        ))
    }

    fn import_from_bytes(&self, bytes: &[u8]) -> Result<ImageAnnotations, FormatError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
