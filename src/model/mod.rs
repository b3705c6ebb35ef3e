//! Annotation data model: labels, bounding boxes, and per-image records.

mod bbox;
mod label;
mod record;

pub use bbox::{BboxHistoryEntry, BboxOperation, BboxUpdate, BoundingBox, ClassNameUpdate};
pub use label::{Label, LabelValue, SelectionMode};
pub use record::{AnnotationRecord, ImageAnnotations};
