//! Annotation persistence.
//!
//! Codecs implement the `AnnotationFormat` trait and convert the in-memory
//! [`ImageAnnotations`](crate::model::ImageAnnotations) to and from files.
//! The `AnnotationWriter` decides when to write, and `load_from_storage`
//! picks up a previous session.
//!
//! ## Supported Formats
//!
//! - **Native JSON**: full fidelity (labels, boxes, history, dimensions)
//! - **COCO JSON**: boxes only, normalized `[x, y, w, h]`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use annotate_cv::format::{AnnotationStorage, AnnotationWriter, StorageFrequency};
//!
//! let storage = AnnotationStorage::none()
//!     .with_json("out/annotations.json")
//!     .with_coco("out/coco.json")
//!     .with_frequency(StorageFrequency::EveryNOperations(5));
//! let mut writer = AnnotationWriter::new(storage);
//! writer.write(&annotations)?;
//! ```

mod error;
pub mod formats;
mod storage;
mod traits;
mod writer;

pub use error::FormatError;
pub use formats::{CocoFormat, NativeJsonFormat};
pub use storage::{AnnotationStorage, StorageFrequency, StorageType, load_from_storage};
pub use traits::{AnnotationFormat, ExportResult, FormatWarning, WarningSeverity};
pub use writer::AnnotationWriter;
