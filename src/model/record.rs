//! Per-image annotation records and the record set that owns them.
//!
//! Records are only mutated through [`ImageAnnotations`] methods so that
//! every edit goes through the same history bookkeeping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};
use crate::model::bbox::{BboxHistoryEntry, BboxOperation, BboxUpdate, BoundingBox};
use crate::model::label::Label;

/// All annotation data for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Image identifier (same as the key in the record set)
    pub image_name: String,

    /// Classification label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Label>,

    /// Boxes in creation order; the index addresses a box for edits
    #[serde(rename = "bboxs", default, skip_serializing_if = "Vec::is_empty")]
    pub bboxes: Vec<BoundingBox>,

    /// Previous labels, most recent first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history_labels: Vec<Label>,

    /// Box edits, most recent first
    #[serde(rename = "history_bboxs", default, skip_serializing_if = "Vec::is_empty")]
    pub history_bboxes: Vec<BboxHistoryEntry>,

    /// Image width in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_width: Option<u32>,

    /// Image height in pixels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_height: Option<u32>,
}

impl AnnotationRecord {
    /// Create an empty record.
    pub fn new(image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            label: None,
            bboxes: Vec::new(),
            history_labels: Vec::new(),
            history_bboxes: Vec::new(),
            image_width: None,
            image_height: None,
        }
    }

    /// Set the image dimensions.
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.image_width = Some(width);
        self.image_height = Some(height);
        self
    }

    /// Set the label.
    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    /// Set the boxes.
    pub fn with_bboxes(mut self, bboxes: Vec<BoundingBox>) -> Self {
        self.bboxes = bboxes;
        self
    }

    /// Image dimensions, if both are known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.image_width.zip(self.image_height)
    }

    fn fill_dimensions(&mut self, dimensions: Option<(u32, u32)>) {
        if let Some((w, h)) = dimensions {
            if self.image_width.is_none() {
                self.image_width = Some(w);
            }
            if self.image_height.is_none() {
                self.image_height = Some(h);
            }
        }
    }

    fn bbox_index_check(&self, index: usize) -> Result<()> {
        if index < self.bboxes.len() {
            Ok(())
        } else {
            Err(AnnotateError::BboxIndexOutOfRange {
                index,
                len: self.bboxes.len(),
            })
        }
    }
}

/// Mapping from image identifier to its annotation record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageAnnotations {
    image_to_entry: BTreeMap<String, AnnotationRecord>,
}

impl ImageAnnotations {
    /// Create an empty record set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of annotated images.
    pub fn len(&self) -> usize {
        self.image_to_entry.len()
    }

    /// Whether no image has a record.
    pub fn is_empty(&self) -> bool {
        self.image_to_entry.is_empty()
    }

    /// Whether the image has a record.
    pub fn contains(&self, image_name: &str) -> bool {
        self.image_to_entry.contains_key(image_name)
    }

    /// Record for an image.
    pub fn get(&self, image_name: &str) -> Option<&AnnotationRecord> {
        self.image_to_entry.get(image_name)
    }

    /// Iterate over records ordered by image name.
    pub fn records(&self) -> impl Iterator<Item = &AnnotationRecord> {
        self.image_to_entry.values()
    }

    /// Total number of boxes across all records.
    pub fn total_bboxes(&self) -> usize {
        self.records().map(|r| r.bboxes.len()).sum()
    }

    /// Insert a complete record, replacing any record with the same name.
    pub fn insert(&mut self, record: AnnotationRecord) {
        self.image_to_entry.insert(record.image_name.clone(), record);
    }

    /// Get the record for an image, creating an empty one if needed.
    ///
    /// Known dimensions fill in missing width/height on existing records.
    pub fn get_or_create(
        &mut self,
        image_name: &str,
        dimensions: Option<(u32, u32)>,
    ) -> &AnnotationRecord {
        self.entry(image_name, dimensions)
    }

    fn entry(&mut self, image_name: &str, dimensions: Option<(u32, u32)>) -> &mut AnnotationRecord {
        let record = self
            .image_to_entry
            .entry(image_name.to_string())
            .or_insert_with(|| AnnotationRecord::new(image_name));
        record.fill_dimensions(dimensions);
        record
    }

    /// Assign a label.
    ///
    /// Returns `false` and leaves the record untouched when the stored label
    /// already has the same value. A changed label is also prepended to the
    /// label history when `record_history` is set.
    pub fn set_label(
        &mut self,
        image_name: &str,
        label: Label,
        dimensions: Option<(u32, u32)>,
        record_history: bool,
    ) -> bool {
        let record = self.entry(image_name, dimensions);
        if record.label.as_ref() == Some(&label) {
            return false;
        }
        if record_history {
            record.history_labels.insert(0, label.clone());
        }
        record.label = Some(label);
        true
    }

    /// Append a box to an image's record.
    pub fn push_bbox(
        &mut self,
        image_name: &str,
        bbox: BoundingBox,
        dimensions: Option<(u32, u32)>,
        record_history: bool,
    ) {
        let record = self.entry(image_name, dimensions);
        if record_history {
            record
                .history_bboxes
                .insert(0, BboxHistoryEntry::new(BboxOperation::Add, bbox.clone()));
        }
        record.bboxes.push(bbox);
    }

    /// Apply a partial update to a box and stamp new provenance.
    ///
    /// Returns the updated box.
    pub fn update_bbox(
        &mut self,
        image_name: &str,
        index: usize,
        update: &BboxUpdate,
        timestamp: Option<f64>,
        author: Option<String>,
        record_history: bool,
    ) -> Result<BoundingBox> {
        let record = self
            .image_to_entry
            .get_mut(image_name)
            .ok_or(AnnotateError::BboxIndexOutOfRange { index, len: 0 })?;
        record.bbox_index_check(index)?;

        let bbox = &mut record.bboxes[index];
        update.apply_to(bbox);
        bbox.timestamp = timestamp;
        bbox.author = author;
        let updated = bbox.clone();

        if record_history {
            record.history_bboxes.insert(
                0,
                BboxHistoryEntry::new(BboxOperation::Update, updated.clone()),
            );
        }
        Ok(updated)
    }

    /// Remove a box by index and return it.
    pub fn remove_bbox(
        &mut self,
        image_name: &str,
        index: usize,
        record_history: bool,
    ) -> Result<BoundingBox> {
        let record = self
            .image_to_entry
            .get_mut(image_name)
            .ok_or(AnnotateError::BboxIndexOutOfRange { index, len: 0 })?;
        record.bbox_index_check(index)?;

        let removed = record.bboxes.remove(index);
        if record_history {
            record.history_bboxes.insert(
                0,
                BboxHistoryEntry::new(BboxOperation::Delete, removed.clone()),
            );
        }
        Ok(removed)
    }
}

impl FromIterator<AnnotationRecord> for ImageAnnotations {
    fn from_iter<I: IntoIterator<Item = AnnotationRecord>>(iter: I) -> Self {
        let mut annotations = Self::new();
        for record in iter {
            annotations.insert(record);
        }
        annotations
    }
}
