//! Bounding boxes and their edit history.

use serde::{Deserialize, Serialize};

use crate::geometry::{self, Xywh, Xyxy};

/// A bounding box in pixel coordinates.
///
/// Two boxes are equal when their corners and class name match; timestamp
/// and author are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Corners as `[x1, y1, x2, y2]`
    pub xyxy: Xyxy,
    /// Class from the label catalog, if assigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    /// Seconds since the Unix epoch of the last edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    /// Who made the last edit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl BoundingBox {
    /// Create a box with no class or provenance.
    pub fn new(xyxy: Xyxy) -> Self {
        Self {
            xyxy,
            class_name: None,
            timestamp: None,
            author: None,
        }
    }

    /// Set the class name.
    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set timestamp and author.
    pub fn with_provenance(mut self, timestamp: Option<f64>, author: Option<String>) -> Self {
        self.timestamp = timestamp;
        self.author = author;
        self
    }

    /// Copy of this box with corners reordered to `x1 <= x2`, `y1 <= y2`.
    pub fn with_sorted_corners(mut self) -> Self {
        self.xyxy = geometry::sort_corners(self.xyxy);
        self
    }

    /// Box in `[x, y, w, h]` form.
    pub fn xywh(&self) -> Xywh {
        geometry::xyxy_to_xywh(self.xyxy)
    }

    /// Area in pixels.
    pub fn area(&self) -> f64 {
        geometry::area(self.xyxy)
    }
}

impl PartialEq for BoundingBox {
    fn eq(&self, other: &Self) -> bool {
        self.xyxy == other.xyxy && self.class_name == other.class_name
    }
}

/// Kind of edit recorded in the box history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BboxOperation {
    /// Box was created
    Add,
    /// Box was removed
    Delete,
    /// Box geometry or class changed
    Update,
}

/// One entry of a record's box history: the operation and a snapshot of
/// the box as it was after an add/update or before a delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BboxHistoryEntry {
    /// What happened
    pub operation: BboxOperation,
    /// Snapshot of the box
    pub bbox: BoundingBox,
}

impl BboxHistoryEntry {
    /// Create a history entry.
    pub fn new(operation: BboxOperation, bbox: BoundingBox) -> Self {
        Self { operation, bbox }
    }
}

/// Change to a box's class name in an update.
///
/// Keeping and clearing are distinct: a box may legitimately lose its class.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClassNameUpdate {
    /// Leave the class name as it is
    #[default]
    Keep,
    /// Remove the class name
    Clear,
    /// Replace the class name
    Set(String),
}

/// Partial update of an existing box. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BboxUpdate {
    /// New corners, if changing geometry
    pub xyxy: Option<Xyxy>,
    /// Class name change
    pub class_name: ClassNameUpdate,
}

impl BboxUpdate {
    /// Update that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the corners.
    pub fn xyxy(mut self, xyxy: Xyxy) -> Self {
        self.xyxy = Some(xyxy);
        self
    }

    /// Replace the class name.
    pub fn class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = ClassNameUpdate::Set(class_name.into());
        self
    }

    /// Clear the class name.
    pub fn clear_class_name(mut self) -> Self {
        self.class_name = ClassNameUpdate::Clear;
        self
    }

    /// Apply to a box in place, leaving provenance untouched.
    pub fn apply_to(&self, bbox: &mut BoundingBox) {
        if let Some(xyxy) = self.xyxy {
            bbox.xyxy = xyxy;
        }
        match &self.class_name {
            ClassNameUpdate::Keep => {}
            ClassNameUpdate::Clear => bbox.class_name = None,
            ClassNameUpdate::Set(name) => bbox.class_name = Some(name.clone()),
        }
    }
}
