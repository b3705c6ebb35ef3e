//! Image sequences and label catalogs.
//!
//! This module provides:
//! - `ImageSource`: where images come from (in memory, a folder, a file list)
//! - `ImageCursor`: a stateful forward/backward walk over a source
//! - `ImageOpener`: the decode step used by file-backed sources
//! - `LabelSource`: where the label catalog comes from

mod cursor;
mod image_source;
mod label_source;
mod opener;

pub use cursor::{CursorItem, ImageCursor};
pub use image_source::{ImageSource, pattern_matches};
pub use label_source::LabelSource;
pub use opener::{FileImageOpener, ImageOpener, SharedImage};
