//! annotate-cv - image annotation core
//!
//! Step through a collection of images, assign classification labels or
//! draw bounding boxes, and persist the result as native JSON or COCO.
//!
//! The [`AnnotationController`] is the entry point: it owns the label
//! catalog, a cursor over an [`ImageSource`](data::ImageSource), and the
//! [`ImageAnnotations`](model::ImageAnnotations) record set, and offers every
//! change to the storage writer.

pub mod config;
pub mod controller;
pub mod data;
pub mod error;
pub mod format;
pub mod geometry;
pub mod model;
pub mod session;

pub use controller::{AnnotateOptions, AnnotationController, CurrentView};
pub use error::{AnnotateError, Result};
