//! Error types for annotation sessions.

use std::path::PathBuf;
use thiserror::Error;

use crate::format::FormatError;
use crate::model::SelectionMode;

/// Errors raised by the image cursor, label catalog, and controller.
#[derive(Error, Debug)]
pub enum AnnotateError {
    /// Cursor moved past the last image
    #[error("No more images after the last one")]
    IndexAboveRange,

    /// Cursor moved before the first image
    #[error("No images before the first one")]
    IndexBelowRange,

    /// Label value not in the resolved catalog
    #[error("Label value '{value}' not in allowed labels: {allowed:?}")]
    InvalidLabel {
        /// The rejected value
        value: String,
        /// The resolved catalog
        allowed: Vec<String>,
    },

    /// Malformed or degenerate bounding box
    #[error("Invalid bounding box: {message}")]
    InvalidBoundingBox {
        /// Description of what is wrong with the box
        message: String,
    },

    /// Mutation attempted with no image loaded
    #[error("No current image")]
    NoCurrentImage,

    /// Label operation does not match the configured selection mode
    #[error("Selection mode is {actual:?} but the operation requires {expected:?}")]
    WrongSelectionMode {
        /// Mode the operation needs
        expected: SelectionMode,
        /// Mode the controller is configured with
        actual: SelectionMode,
    },

    /// Bounding box index does not address an existing box
    #[error("Bounding box index {index} out of range ({len} boxes)")]
    BboxIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of boxes on the image
        len: usize,
    },

    /// Label source file has malformed contents
    #[error("Invalid label source {path:?}: {message}")]
    LabelSource {
        /// File that was read
        path: PathBuf,
        /// Description of the problem
        message: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Image decoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing an annotation file failed
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl AnnotateError {
    /// Create an invalid bounding box error with a message.
    pub fn invalid_bbox(message: impl Into<String>) -> Self {
        Self::InvalidBoundingBox {
            message: message.into(),
        }
    }

    /// Create a configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a label source error for the given file.
    pub fn label_source(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::LabelSource {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error signals that the cursor ran off either end.
    ///
    /// These are expected states rather than failures: the caller shows
    /// "finished" or "start of sequence" instead of an error message.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::IndexAboveRange | Self::IndexBelowRange)
    }
}

/// Result alias for annotation operations.
pub type Result<T, E = AnnotateError> = std::result::Result<T, E>;
