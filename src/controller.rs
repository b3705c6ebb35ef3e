//! Annotation controller.
//!
//! Owns the resolved label catalog, the image cursor and the record set, and
//! keeps a read-only view of the current image in sync with the records
//! after every navigation or mutation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::data::{CursorItem, ImageCursor, ImageSource, LabelSource, SharedImage};
use crate::error::{AnnotateError, Result};
use crate::format::{AnnotationStorage, AnnotationWriter, load_from_storage};
use crate::geometry::{self, Xyxy};
use crate::model::{
    BboxUpdate, BoundingBox, ClassNameUpdate, ImageAnnotations, Label, LabelValue, SelectionMode,
};

/// Session behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateOptions {
    /// Whether labels are single- or multi-select
    pub selection_mode: SelectionMode,
    /// Stamp labels and boxes with the wall-clock time
    pub store_timestamps: bool,
    /// Keep label and box history
    pub store_history: bool,
    /// Key records by file name instead of the full source name
    pub use_basename_for_image: bool,
    /// Author stamped on labels and boxes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            selection_mode: SelectionMode::Single,
            store_timestamps: true,
            store_history: true,
            use_basename_for_image: false,
            author: None,
        }
    }
}

impl AnnotateOptions {
    /// Set the selection mode.
    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

/// The image being annotated and what is stored for it.
#[derive(Debug, Clone)]
pub struct CurrentView {
    /// Position in the image sequence
    pub index: usize,
    /// Source name of the image
    pub image_name: String,
    /// The decoded image
    pub image: SharedImage,
    /// Stored label, if any
    pub label: Option<LabelValue>,
    /// Stored boxes
    pub bboxes: Vec<BoundingBox>,
}

/// Stateful annotation session over one image sequence.
#[derive(Debug)]
pub struct AnnotationController {
    options: AnnotateOptions,
    labels: Vec<String>,
    cursor: ImageCursor,
    annotations: ImageAnnotations,
    writer: AnnotationWriter,
    current: Option<CurrentView>,
}

impl AnnotationController {
    /// Start a session, resuming from storage when a previous save exists.
    pub fn new(
        label_source: &LabelSource,
        image_source: ImageSource,
        storage: AnnotationStorage,
        options: AnnotateOptions,
    ) -> Result<Self> {
        storage.validate()?;
        let existing = load_from_storage(&storage)?.unwrap_or_default();
        let cursor = ImageCursor::new(image_source)?;
        Self::with_cursor(label_source, cursor, storage, existing, options)
    }

    /// Start a session from records supplied by the caller.
    ///
    /// Storage is only written to, never read.
    pub fn with_annotations(
        label_source: &LabelSource,
        image_source: ImageSource,
        storage: AnnotationStorage,
        annotations: ImageAnnotations,
        options: AnnotateOptions,
    ) -> Result<Self> {
        storage.validate()?;
        let cursor = ImageCursor::new(image_source)?;
        Self::with_cursor(label_source, cursor, storage, annotations, options)
    }

    /// Start a session over a prepared cursor.
    ///
    /// An empty sequence is not an error: the session starts with no
    /// current image.
    pub fn with_cursor(
        label_source: &LabelSource,
        mut cursor: ImageCursor,
        storage: AnnotationStorage,
        annotations: ImageAnnotations,
        options: AnnotateOptions,
    ) -> Result<Self> {
        let labels = label_source.resolve()?;
        log::info!(
            "Annotating {} images with {} labels ({} existing records)",
            cursor.count(),
            labels.len(),
            annotations.len()
        );

        let first = match cursor.advance() {
            Ok(item) => Some(item),
            Err(AnnotateError::IndexAboveRange) => {
                log::warn!("Image sequence is empty");
                None
            }
            Err(e) => return Err(e),
        };

        let mut controller = Self {
            options,
            labels,
            cursor,
            annotations,
            writer: AnnotationWriter::new(storage),
            current: None,
        };
        if let Some(item) = first {
            controller.set_current(item);
        }
        Ok(controller)
    }

    /// Resolved label catalog.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of images in the sequence.
    pub fn image_count(&self) -> usize {
        self.cursor.count()
    }

    /// Current image view, `None` when the sequence is empty.
    pub fn current(&self) -> Option<&CurrentView> {
        self.current.as_ref()
    }

    /// All records.
    pub fn annotations(&self) -> &ImageAnnotations {
        &self.annotations
    }

    /// Session options.
    pub fn options(&self) -> &AnnotateOptions {
        &self.options
    }

    /// Write all records now, ignoring the write frequency.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush(&self.annotations)?;
        Ok(())
    }

    // Navigation

    /// Move to the next image.
    ///
    /// Past the last image this fails with [`AnnotateError::IndexAboveRange`]
    /// and the current view is left as it was.
    pub fn next_image(&mut self) -> Result<()> {
        let item = self.cursor.advance()?;
        self.set_current(item);
        Ok(())
    }

    /// Move to the previous image.
    ///
    /// Before the first image this fails with
    /// [`AnnotateError::IndexBelowRange`] and the current view is left as it
    /// was.
    pub fn previous_image(&mut self) -> Result<()> {
        let item = self.cursor.retreat()?;
        self.set_current(item);
        Ok(())
    }

    /// Move forward to the first image without a record.
    ///
    /// Stays put if the current image has no record yet. Fails with
    /// [`AnnotateError::IndexAboveRange`] when every remaining image has one.
    pub fn skip_to_next_missing_annotation(&mut self) -> Result<()> {
        let current = self.current.as_ref().ok_or(AnnotateError::NoCurrentImage)?;
        let mut key = self.image_key(&current.image_name);
        let mut landed = None;

        while self.annotations.contains(&key) {
            let item = self.cursor.advance()?;
            key = self.image_key(&item.name);
            landed = Some(item);
        }

        if let Some(item) = landed {
            log::debug!("Skipped to unannotated image {}", item.name);
            self.set_current(item);
        }
        Ok(())
    }

    // Labels

    /// Store a single label for the current image and move to the next one.
    ///
    /// The label is stored and written before moving, so at the last image
    /// the label is kept and [`AnnotateError::IndexAboveRange`] is returned.
    pub fn store_label_single(&mut self, value: &str) -> Result<()> {
        self.check_selection_mode(SelectionMode::Single)?;
        self.check_label(value)?;

        let label = Label::single(value)
            .with_timestamp(self.timestamp())
            .with_author(self.options.author.clone());
        self.store_label(label)
    }

    /// Store a multi-select label for the current image and move to the
    /// next one.
    ///
    /// Repeated values are dropped, keeping the first occurrence.
    pub fn store_label_multiple<S: AsRef<str>>(&mut self, values: &[S]) -> Result<()> {
        self.check_selection_mode(SelectionMode::Multiple)?;

        let mut unique: Vec<String> = Vec::with_capacity(values.len());
        for value in values {
            let value = value.as_ref();
            self.check_label(value)?;
            if !unique.iter().any(|v| v == value) {
                unique.push(value.to_string());
            }
        }

        let label = Label::multiple(unique)
            .with_timestamp(self.timestamp())
            .with_author(self.options.author.clone());
        self.store_label(label)
    }

    fn store_label(&mut self, label: Label) -> Result<()> {
        let (key, dimensions) = self.current_key()?;

        let changed = self.annotations.set_label(
            &key,
            label,
            dimensions,
            self.options.store_history,
        );
        if changed {
            log::debug!("Stored label for {}", key);
        } else {
            log::debug!("Label for {} unchanged", key);
        }

        self.writer.write(&self.annotations)?;
        self.refresh_current();
        self.next_image()
    }

    // Boxes

    /// Add a box to the current image.
    ///
    /// Provenance on `bbox` is replaced by the session's timestamp and
    /// author. Does not move to another image.
    pub fn add_bbox(&mut self, bbox: BoundingBox) -> Result<()> {
        self.check_bbox(&bbox)?;
        let (key, dimensions) = self.current_key()?;

        let bbox = self.stamp(bbox);
        log::debug!("Adding box {:?} to {}", bbox.xyxy, key);
        self.annotations
            .push_bbox(&key, bbox, dimensions, self.options.store_history);

        self.writer.write(&self.annotations)?;
        self.refresh_current();
        Ok(())
    }

    /// Change the coordinates and/or class of a box on the current image.
    ///
    /// The timestamp is refreshed even when nothing else changes. Returns the
    /// updated box.
    pub fn update_bbox(&mut self, index: usize, update: BboxUpdate) -> Result<BoundingBox> {
        if let Some(xyxy) = update.xyxy {
            check_xyxy(xyxy)?;
        }
        if let ClassNameUpdate::Set(class_name) = &update.class_name {
            self.check_label(class_name)?;
        }
        let (key, _) = self.current_key()?;

        let updated = self.annotations.update_bbox(
            &key,
            index,
            &update,
            self.timestamp(),
            self.options.author.clone(),
            self.options.store_history,
        )?;
        log::debug!("Updated box {} on {}: {:?}", index, key, updated.xyxy);

        self.writer.write(&self.annotations)?;
        self.refresh_current();
        Ok(updated)
    }

    /// Remove a box from the current image and return it.
    pub fn delete_bbox(&mut self, index: usize) -> Result<BoundingBox> {
        let (key, _) = self.current_key()?;

        let removed = self
            .annotations
            .remove_bbox(&key, index, self.options.store_history)?;
        log::debug!("Deleted box {} on {}", index, key);

        self.writer.write(&self.annotations)?;
        self.refresh_current();
        Ok(removed)
    }

    /// Make the current image's boxes match `bboxes`.
    ///
    /// Boxes not already present (by coordinates and class) are added. Then
    /// existing boxes whose coordinates appear nowhere in `bboxes` are
    /// removed, so a box matching a listed box's coordinates but not its
    /// class is kept. Nothing changes if any box is invalid.
    pub fn set_bboxes(&mut self, bboxes: Vec<BoundingBox>) -> Result<()> {
        for bbox in &bboxes {
            self.check_bbox(bbox)?;
        }
        let (key, dimensions) = self.current_key()?;
        self.annotations.get_or_create(&key, dimensions);

        let mut added = 0;
        for bbox in bboxes.iter().cloned() {
            let present = self
                .annotations
                .get(&key)
                .is_some_and(|r| r.bboxes.contains(&bbox));
            if !present {
                let bbox = self.stamp(bbox);
                self.annotations
                    .push_bbox(&key, bbox, None, self.options.store_history);
                added += 1;
            }
        }

        let stale: Vec<usize> = self
            .annotations
            .get(&key)
            .map(|r| {
                r.bboxes
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| !bboxes.iter().any(|n| n.xyxy == b.xyxy))
                    .map(|(i, _)| i)
                    .collect()
            })
            .unwrap_or_default();
        for &index in stale.iter().rev() {
            self.annotations
                .remove_bbox(&key, index, self.options.store_history)?;
        }
        log::debug!(
            "Set boxes on {}: {} added, {} removed",
            key,
            added,
            stale.len()
        );

        self.writer.write(&self.annotations)?;
        self.refresh_current();
        Ok(())
    }

    // Helpers

    fn check_selection_mode(&self, expected: SelectionMode) -> Result<()> {
        if self.options.selection_mode != expected {
            return Err(AnnotateError::WrongSelectionMode {
                expected,
                actual: self.options.selection_mode,
            });
        }
        Ok(())
    }

    fn check_label(&self, value: &str) -> Result<()> {
        if self.labels.iter().any(|l| l == value) {
            Ok(())
        } else {
            Err(AnnotateError::InvalidLabel {
                value: value.to_string(),
                allowed: self.labels.clone(),
            })
        }
    }

    fn check_bbox(&self, bbox: &BoundingBox) -> Result<()> {
        if let Some(class_name) = &bbox.class_name {
            self.check_label(class_name)?;
        }
        check_xyxy(bbox.xyxy)
    }

    /// Record key and pixel dimensions of the current image.
    fn current_key(&self) -> Result<(String, Option<(u32, u32)>)> {
        let current = self.current.as_ref().ok_or(AnnotateError::NoCurrentImage)?;
        Ok((
            self.image_key(&current.image_name),
            Some((current.image.width(), current.image.height())),
        ))
    }

    fn image_key(&self, image_name: &str) -> String {
        if self.options.use_basename_for_image {
            if let Some(file_name) = Path::new(image_name).file_name() {
                return file_name.to_string_lossy().into_owned();
            }
        }
        image_name.to_string()
    }

    fn timestamp(&self) -> Option<f64> {
        if !self.options.store_timestamps {
            return None;
        }
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs_f64())
    }

    fn stamp(&self, bbox: BoundingBox) -> BoundingBox {
        bbox.with_provenance(self.timestamp(), self.options.author.clone())
    }

    fn set_current(&mut self, item: CursorItem) {
        let key = self.image_key(&item.name);
        let record = self.annotations.get(&key);
        self.current = Some(CurrentView {
            index: item.index,
            image_name: item.name,
            image: item.image,
            label: record.and_then(|r| r.label.as_ref()).map(|l| l.value.clone()),
            bboxes: record.map(|r| r.bboxes.clone()).unwrap_or_default(),
        });
    }

    fn refresh_current(&mut self) {
        if let Some(current) = self.current.take() {
            self.set_current(CursorItem {
                index: current.index,
                name: current.image_name,
                image: current.image,
            });
        }
    }
}

fn check_xyxy(xyxy: Xyxy) -> Result<()> {
    if geometry::is_valid_xyxy(xyxy) {
        Ok(())
    } else {
        Err(AnnotateError::invalid_bbox(format!(
            "expected finite x1 < x2 and y1 < y2, got {:?}",
            xyxy
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{AnnotationFormat, NativeJsonFormat, StorageFrequency};
    use crate::model::BboxOperation;
    use image::DynamicImage;

    fn images(names: &[&str]) -> ImageSource {
        ImageSource::preloaded(
            names
                .iter()
                .map(|n| (n.to_string(), DynamicImage::new_rgb8(64, 48))),
        )
    }

    fn controller(names: &[&str], options: AnnotateOptions) -> AnnotationController {
        AnnotationController::new(
            &LabelSource::inline(["cat", "dog"]),
            images(names),
            AnnotationStorage::none(),
            options,
        )
        .unwrap()
    }

    fn scenario() -> AnnotationController {
        controller(&["chelsea", "astronaut", "camera"], AnnotateOptions::default())
    }

    fn current_name(c: &AnnotationController) -> &str {
        &c.current().unwrap().image_name
    }

    #[test]
    fn test_label_navigation_scenario() {
        let mut c = scenario();
        assert_eq!(current_name(&c), "chelsea");
        assert_eq!(c.image_count(), 3);

        c.store_label_single("cat").unwrap();
        let record = c.annotations().get("chelsea").unwrap();
        assert_eq!(record.label.as_ref().unwrap().value.as_single(), Some("cat"));
        assert_eq!(current_name(&c), "astronaut");

        c.store_label_single("dog").unwrap();
        assert_eq!(current_name(&c), "camera");

        c.previous_image().unwrap();
        c.previous_image().unwrap();
        assert_eq!(current_name(&c), "chelsea");
        assert_eq!(
            c.current().unwrap().label,
            Some(LabelValue::Single("cat".into()))
        );

        c.skip_to_next_missing_annotation().unwrap();
        assert_eq!(current_name(&c), "camera");
        assert_eq!(c.current().unwrap().index, 2);
    }

    #[test]
    fn test_next_then_previous_round_trip() {
        let mut c = scenario();
        c.next_image().unwrap();
        let before = (c.current().unwrap().index, current_name(&c).to_string());
        c.next_image().unwrap();
        c.previous_image().unwrap();
        let after = (c.current().unwrap().index, current_name(&c).to_string());
        assert_eq!(before, after);
    }

    #[test]
    fn test_navigation_errors_keep_current() {
        let mut c = scenario();
        assert!(matches!(c.previous_image(), Err(AnnotateError::IndexBelowRange)));
        assert_eq!(current_name(&c), "chelsea");

        c.next_image().unwrap();
        c.next_image().unwrap();
        let err = c.next_image().unwrap_err();
        assert!(err.is_exhausted());
        assert_eq!(current_name(&c), "camera");
    }

    #[test]
    fn test_invalid_label_leaves_records_unchanged() {
        let mut c = scenario();
        let err = c.store_label_single("horse").unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidLabel { .. }));
        assert!(c.annotations().is_empty());
        assert_eq!(current_name(&c), "chelsea");
    }

    #[test]
    fn test_store_label_at_last_image() {
        let mut c = controller(&["only"], AnnotateOptions::default());
        let err = c.store_label_single("cat").unwrap_err();
        assert!(matches!(err, AnnotateError::IndexAboveRange));

        // Stored before the move failed
        assert!(c.annotations().contains("only"));
        assert_eq!(
            c.current().unwrap().label,
            Some(LabelValue::Single("cat".into()))
        );
    }

    #[test]
    fn test_same_label_does_not_grow_history() {
        let mut c = scenario();
        c.store_label_single("cat").unwrap();
        c.previous_image().unwrap();
        c.store_label_single("cat").unwrap();
        c.previous_image().unwrap();
        c.store_label_single("dog").unwrap();

        let record = c.annotations().get("chelsea").unwrap();
        assert_eq!(record.history_labels.len(), 2);
        assert_eq!(record.history_labels[0].value.as_single(), Some("dog"));
    }

    #[test]
    fn test_label_stamps_and_dimensions() {
        let options = AnnotateOptions::default().with_author("ann");
        let mut c = controller(&["a", "b"], options);
        c.store_label_single("cat").unwrap();

        let record = c.annotations().get("a").unwrap();
        let label = record.label.as_ref().unwrap();
        assert!(label.timestamp.is_some());
        assert_eq!(label.author.as_deref(), Some("ann"));
        assert_eq!(record.dimensions(), Some((64, 48)));
    }

    #[test]
    fn test_without_timestamps_or_history() {
        let options = AnnotateOptions {
            store_timestamps: false,
            store_history: false,
            ..Default::default()
        };
        let mut c = controller(&["a", "b"], options);
        c.store_label_single("cat").unwrap();
        c.previous_image().unwrap();
        c.add_bbox(BoundingBox::new([0.0, 0.0, 1.0, 1.0])).unwrap();

        let record = c.annotations().get("a").unwrap();
        assert!(record.label.as_ref().unwrap().timestamp.is_none());
        assert!(record.bboxes[0].timestamp.is_none());
        assert!(record.history_labels.is_empty());
        assert!(record.history_bboxes.is_empty());
    }

    #[test]
    fn test_empty_sequence() {
        let mut c = controller(&[], AnnotateOptions::default());
        assert!(c.current().is_none());
        assert_eq!(c.image_count(), 0);
        assert!(matches!(
            c.store_label_single("cat"),
            Err(AnnotateError::NoCurrentImage)
        ));
        assert!(matches!(
            c.add_bbox(BoundingBox::new([0.0, 0.0, 1.0, 1.0])),
            Err(AnnotateError::NoCurrentImage)
        ));
    }

    #[test]
    fn test_selection_mode_mismatch() {
        let mut c = scenario();
        assert!(matches!(
            c.store_label_multiple(&["cat"]),
            Err(AnnotateError::WrongSelectionMode {
                expected: SelectionMode::Multiple,
                actual: SelectionMode::Single,
            })
        ));

        let options = AnnotateOptions::default().with_selection_mode(SelectionMode::Multiple);
        let mut c = controller(&["a", "b"], options);
        assert!(matches!(
            c.store_label_single("cat"),
            Err(AnnotateError::WrongSelectionMode { .. })
        ));
    }

    #[test]
    fn test_store_label_multiple() {
        let options = AnnotateOptions::default().with_selection_mode(SelectionMode::Multiple);
        let mut c = controller(&["a", "b"], options);

        assert!(matches!(
            c.store_label_multiple(&["cat", "horse"]),
            Err(AnnotateError::InvalidLabel { .. })
        ));
        c.store_label_multiple(&["dog", "cat", "dog"]).unwrap();

        let label = &c.annotations().get("a").unwrap().label;
        assert_eq!(
            label.as_ref().unwrap().value.as_multiple(),
            Some(&["dog".to_string(), "cat".to_string()][..])
        );
        assert_eq!(current_name(&c), "b");
    }

    #[test]
    fn test_invalid_bbox_rejected() {
        let mut c = scenario();
        c.add_bbox(BoundingBox::new([0.0, 0.0, 10.0, 10.0]).with_class("cat"))
            .unwrap();
        let err = c
            .add_bbox(BoundingBox::new([0.0, 0.0, -10.0, 10.0]).with_class("cat"))
            .unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidBoundingBox { .. }));

        let record = c.annotations().get("chelsea").unwrap();
        assert_eq!(
            record.bboxes,
            vec![BoundingBox::new([0.0, 0.0, 10.0, 10.0]).with_class("cat")]
        );
        assert!(matches!(
            c.add_bbox(BoundingBox::new([0.0, 0.0, 1.0, 1.0]).with_class("horse")),
            Err(AnnotateError::InvalidLabel { .. })
        ));
    }

    #[test]
    fn test_add_does_not_advance() {
        let mut c = scenario();
        c.add_bbox(BoundingBox::new([1.0, 2.0, 3.0, 4.0])).unwrap();
        assert_eq!(current_name(&c), "chelsea");
        assert_eq!(c.current().unwrap().bboxes.len(), 1);
    }

    #[test]
    fn test_add_then_delete_history() {
        let mut c = scenario();
        let bbox = BoundingBox::new([0.0, 0.0, 10.0, 10.0]).with_class("cat");
        c.add_bbox(bbox.clone()).unwrap();
        let removed = c.delete_bbox(0).unwrap();
        assert_eq!(removed, bbox);

        let record = c.annotations().get("chelsea").unwrap();
        assert!(record.bboxes.is_empty());
        let ops: Vec<BboxOperation> = record.history_bboxes.iter().map(|h| h.operation).collect();
        assert_eq!(ops, vec![BboxOperation::Delete, BboxOperation::Add]);
        assert!(c.current().unwrap().bboxes.is_empty());
    }

    #[test]
    fn test_delete_out_of_range() {
        let mut c = scenario();
        assert!(matches!(
            c.delete_bbox(0),
            Err(AnnotateError::BboxIndexOutOfRange { index: 0, len: 0 })
        ));
        c.add_bbox(BoundingBox::new([0.0, 0.0, 1.0, 1.0])).unwrap();
        assert!(matches!(
            c.delete_bbox(1),
            Err(AnnotateError::BboxIndexOutOfRange { index: 1, len: 1 })
        ));
    }

    #[test]
    fn test_update_class_only() {
        let options = AnnotateOptions {
            store_timestamps: false,
            ..Default::default()
        };
        let mut c = controller(&["a"], options);
        c.add_bbox(BoundingBox::new([0.0, 0.0, 10.0, 10.0]).with_class("cat"))
            .unwrap();
        assert!(c.current().unwrap().bboxes[0].timestamp.is_none());

        c.options.store_timestamps = true;
        let updated = c.update_bbox(0, BboxUpdate::new().class_name("dog")).unwrap();
        assert_eq!(updated.xyxy, [0.0, 0.0, 10.0, 10.0]);
        assert_eq!(updated.class_name.as_deref(), Some("dog"));
        assert!(updated.timestamp.is_some());

        let record = c.annotations().get("a").unwrap();
        assert_eq!(record.history_bboxes[0].operation, BboxOperation::Update);
    }

    #[test]
    fn test_update_xyxy_only_and_clear_class() {
        let mut c = scenario();
        c.add_bbox(BoundingBox::new([0.0, 0.0, 10.0, 10.0]).with_class("cat"))
            .unwrap();

        let updated = c
            .update_bbox(0, BboxUpdate::new().xyxy([1.0, 1.0, 5.0, 5.0]))
            .unwrap();
        assert_eq!(updated.class_name.as_deref(), Some("cat"));
        assert_eq!(c.current().unwrap().bboxes[0].xyxy, [1.0, 1.0, 5.0, 5.0]);

        let updated = c.update_bbox(0, BboxUpdate::new().clear_class_name()).unwrap();
        assert!(updated.class_name.is_none());

        assert!(matches!(
            c.update_bbox(0, BboxUpdate::new().xyxy([5.0, 5.0, 1.0, 1.0])),
            Err(AnnotateError::InvalidBoundingBox { .. })
        ));
        assert!(matches!(
            c.update_bbox(3, BboxUpdate::new()),
            Err(AnnotateError::BboxIndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_set_bboxes_reconciles() {
        let mut c = scenario();
        let a = BoundingBox::new([0.0, 0.0, 10.0, 10.0]).with_class("cat");
        let b = BoundingBox::new([20.0, 20.0, 30.0, 30.0]).with_class("dog");
        let d = BoundingBox::new([5.0, 5.0, 6.0, 6.0]);
        c.add_bbox(a.clone()).unwrap();
        c.add_bbox(b.clone()).unwrap();

        c.set_bboxes(vec![a.clone(), d.clone()]).unwrap();
        assert_eq!(c.current().unwrap().bboxes, vec![a.clone(), d.clone()]);

        // Same coordinates, different class: both kept
        let a_dog = BoundingBox::new(a.xyxy).with_class("dog");
        c.set_bboxes(vec![a_dog.clone()]).unwrap();
        assert_eq!(c.current().unwrap().bboxes, vec![a, a_dog]);
    }

    #[test]
    fn test_set_bboxes_validates_first() {
        let mut c = scenario();
        let err = c
            .set_bboxes(vec![
                BoundingBox::new([0.0, 0.0, 1.0, 1.0]),
                BoundingBox::new([1.0, 1.0, 1.0, 1.0]),
            ])
            .unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidBoundingBox { .. }));
        assert!(c.annotations().is_empty());
    }

    #[test]
    fn test_basename_keys() {
        let options = AnnotateOptions {
            use_basename_for_image: true,
            ..Default::default()
        };
        let mut c = controller(&["data/one/a.png", "data/two/b.png"], options);
        c.store_label_single("cat").unwrap();
        assert!(c.annotations().contains("a.png"));

        c.previous_image().unwrap();
        assert_eq!(c.current().unwrap().image_name, "data/one/a.png");
        assert_eq!(
            c.current().unwrap().label,
            Some(LabelValue::Single("cat".into()))
        );
        c.skip_to_next_missing_annotation().unwrap();
        assert_eq!(current_name(&c), "data/two/b.png");
    }

    #[test]
    fn test_skip_when_all_annotated() {
        let mut c = scenario();
        c.store_label_single("cat").unwrap();
        c.store_label_single("cat").unwrap();
        let _ = c.store_label_single("cat");
        assert!(matches!(
            c.skip_to_next_missing_annotation(),
            Err(AnnotateError::IndexAboveRange)
        ));
    }

    #[test]
    fn test_persists_and_resumes() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("out").join("annotations.json");
        let storage = AnnotationStorage::none().with_json(&json_path);
        let labels = LabelSource::inline(["cat", "dog"]);

        let mut c = AnnotationController::new(
            &labels,
            images(&["chelsea", "astronaut", "camera"]),
            storage.clone(),
            AnnotateOptions::default(),
        )
        .unwrap();
        c.store_label_single("cat").unwrap();
        c.add_bbox(BoundingBox::new([1.0, 1.0, 9.0, 9.0]).with_class("dog"))
            .unwrap();

        let saved = NativeJsonFormat.import(&json_path).unwrap();
        assert_eq!(&saved, c.annotations());

        let mut resumed = AnnotationController::new(
            &labels,
            images(&["chelsea", "astronaut", "camera"]),
            storage,
            AnnotateOptions::default(),
        )
        .unwrap();
        assert_eq!(
            resumed.current().unwrap().label,
            Some(LabelValue::Single("cat".into()))
        );
        resumed.skip_to_next_missing_annotation().unwrap();
        assert_eq!(current_name(&resumed), "camera");
    }

    #[test]
    fn test_flush_writes_pending() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("annotations.json");
        let storage = AnnotationStorage::none()
            .with_json(&json_path)
            .with_frequency(StorageFrequency::EveryNOperations(100));

        let mut c = AnnotationController::with_annotations(
            &LabelSource::inline(["cat"]),
            images(&["a", "b"]),
            storage,
            ImageAnnotations::new(),
            AnnotateOptions::default(),
        )
        .unwrap();
        c.store_label_single("cat").unwrap();
        assert!(!json_path.exists());

        c.flush().unwrap();
        assert_eq!(NativeJsonFormat.import(&json_path).unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_storage_rejected() {
        let result = AnnotationController::new(
            &LabelSource::inline(["cat"]),
            images(&["a"]),
            AnnotationStorage::none().with_coco("coco.txt"),
            AnnotateOptions::default(),
        );
        assert!(matches!(result, Err(AnnotateError::Config { .. })));
    }
}
