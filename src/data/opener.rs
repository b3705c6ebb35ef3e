//! Image decoding collaborator used by file-backed sources.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;

use crate::error::Result;

/// Decoded image shared between the cursor and the current view.
pub type SharedImage = Arc<DynamicImage>;

/// Opens an image file on demand.
///
/// File-backed sources call this once per navigation step; nothing is
/// cached, so revisiting an index opens the file again.
pub trait ImageOpener: Send + Sync {
    /// Unique identifier for this opener (e.g., "file").
    fn id(&self) -> &'static str;

    /// Decode the image at `path`.
    fn open(&self, path: &Path) -> Result<DynamicImage>;
}

/// Decodes images from disk with the `image` crate.
///
/// Supports whatever formats the enabled `image` features support
/// (PNG, JPEG, BMP, TIFF, WebP, ...).
pub struct FileImageOpener;

impl ImageOpener for FileImageOpener {
    fn id(&self) -> &'static str {
        "file"
    }

    fn open(&self, path: &Path) -> Result<DynamicImage> {
        let img = image::open(path)?;
        log::trace!(
            "FileImageOpener: decoded {:?} ({}x{})",
            path,
            img.width(),
            img.height()
        );
        Ok(img)
    }
}
