//! Bidirectional cursor over an image source.

use std::path::PathBuf;
use std::sync::Arc;

use crate::data::image_source::{self, ImageSource};
use crate::data::opener::{FileImageOpener, ImageOpener, SharedImage};
use crate::error::{AnnotateError, Result};

/// An image produced by a cursor step.
#[derive(Debug, Clone)]
pub struct CursorItem {
    /// Position in the sequence
    pub index: usize,
    /// Source name (file path for file-backed sources)
    pub name: String,
    /// The decoded image
    pub image: SharedImage,
}

/// Snapshot of what the cursor walks over.
enum Entries {
    Preloaded(Vec<(String, SharedImage)>),
    Files(Vec<PathBuf>),
}

/// Stateful cursor over an [`ImageSource`].
///
/// The position starts before the first image, so the first
/// [`advance`](Self::advance) yields index 0. It always stays within
/// `-1..=count`. Folder listings are taken once at construction.
pub struct ImageCursor {
    entries: Entries,
    count: usize,
    position: isize,
    opener: Box<dyn ImageOpener>,
}

impl ImageCursor {
    /// Create a cursor that decodes files from disk.
    pub fn new(source: ImageSource) -> Result<Self> {
        Self::with_opener(source, Box::new(FileImageOpener))
    }

    /// Create a cursor with a custom image opener.
    pub fn with_opener(source: ImageSource, opener: Box<dyn ImageOpener>) -> Result<Self> {
        let entries = match source {
            ImageSource::Preloaded(images) => Entries::Preloaded(images),
            ImageSource::Folder { folder, pattern } => {
                Entries::Files(image_source::list_folder(&folder, &pattern)?)
            }
            ImageSource::Files(files) => Entries::Files(files),
        };
        let count = match &entries {
            Entries::Preloaded(images) => images.len(),
            Entries::Files(files) => files.len(),
        };

        log::debug!("Image cursor over {} images ({} opener)", count, opener.id());

        Ok(Self {
            entries,
            count,
            position: -1,
            opener,
        })
    }

    /// Total number of images.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Current position: `-1` before the start, `count` past the end.
    pub fn position(&self) -> isize {
        self.position
    }

    /// Name of the image at `index`, without loading it.
    pub fn name_at(&self, index: usize) -> Option<String> {
        match &self.entries {
            Entries::Preloaded(images) => images.get(index).map(|(name, _)| name.clone()),
            Entries::Files(files) => files.get(index).map(|p| p.to_string_lossy().into_owned()),
        }
    }

    /// Step forward and load the image there.
    ///
    /// At the last image this moves past the end and fails with
    /// [`AnnotateError::IndexAboveRange`]; further calls keep failing.
    /// If the image cannot be decoded the position does not move.
    pub fn advance(&mut self) -> Result<CursorItem> {
        let count = self.count as isize;
        if self.position >= count - 1 {
            self.position = count;
            return Err(AnnotateError::IndexAboveRange);
        }
        let item = self.load((self.position + 1) as usize)?;
        self.position += 1;
        Ok(item)
    }

    /// Step back and load the image there.
    ///
    /// At the first image this moves before the start and fails with
    /// [`AnnotateError::IndexBelowRange`]; further calls keep failing.
    /// If the image cannot be decoded the position does not move.
    pub fn retreat(&mut self) -> Result<CursorItem> {
        if self.position <= 0 {
            self.position = -1;
            return Err(AnnotateError::IndexBelowRange);
        }
        let item = self.load((self.position - 1) as usize)?;
        self.position -= 1;
        Ok(item)
    }

    fn load(&self, index: usize) -> Result<CursorItem> {
        log::debug!("Loading image at index {}", index);
        match &self.entries {
            Entries::Preloaded(images) => {
                let (name, image) = &images[index];
                Ok(CursorItem {
                    index,
                    name: name.clone(),
                    image: Arc::clone(image),
                })
            }
            Entries::Files(files) => {
                let path = &files[index];
                let image = self.opener.open(path)?;
                Ok(CursorItem {
                    index,
                    name: path.to_string_lossy().into_owned(),
                    image: Arc::new(image),
                })
            }
        }
    }
}

impl std::fmt::Debug for ImageCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCursor")
            .field("count", &self.count)
            .field("position", &self.position)
            .field("opener", &self.opener.id())
            .finish()
    }
}
