//! Where images come from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::{MatchOptions, Pattern};
use image::DynamicImage;

use crate::data::opener::SharedImage;
use crate::error::{AnnotateError, Result};

/// Source of the images to annotate.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Images already decoded in memory, with their names
    Preloaded(Vec<(String, SharedImage)>),
    /// Files in a directory whose names match a glob pattern
    Folder {
        /// Directory to list (not recursive)
        folder: PathBuf,
        /// Glob over file names (`*`, `?`, `[...]`, `[!...]`)
        pattern: String,
    },
    /// An explicit, ordered list of image files
    Files(Vec<PathBuf>),
}

impl ImageSource {
    /// Pattern used when a folder source does not specify one.
    pub const DEFAULT_PATTERN: &'static str = "*.jpg";

    /// Source over in-memory images.
    pub fn preloaded<S: Into<String>>(
        images: impl IntoIterator<Item = (S, DynamicImage)>,
    ) -> Self {
        Self::Preloaded(
            images
                .into_iter()
                .map(|(name, img)| (name.into(), Arc::new(img)))
                .collect(),
        )
    }

    /// Source over the files of a directory matching `pattern`.
    pub fn folder(folder: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self::Folder {
            folder: folder.into(),
            pattern: pattern.into(),
        }
    }

    /// Source over an explicit list of files.
    pub fn files<P: Into<PathBuf>>(files: impl IntoIterator<Item = P>) -> Self {
        Self::Files(files.into_iter().map(Into::into).collect())
    }

    /// Check that a folder pattern is a well-formed glob.
    pub fn validate(&self) -> Result<()> {
        if let ImageSource::Folder { pattern, .. } = self {
            compile_pattern(pattern)?;
        }
        Ok(())
    }
}

/// Names starting with `.` are only matched by a pattern that starts with one.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

fn compile_pattern(pattern: &str) -> Result<Pattern> {
    Pattern::new(pattern).map_err(|e| {
        AnnotateError::config(format!("invalid image pattern '{}': {}", pattern, e))
    })
}

/// Whether the file name `name` matches the glob `pattern`.
pub fn pattern_matches(pattern: &str, name: &str) -> Result<bool> {
    Ok(compile_pattern(pattern)?.matches_with(name, MATCH_OPTIONS))
}

/// List the regular files in `folder` whose names match `pattern`, sorted.
///
/// A missing folder yields an empty list. A malformed pattern is a
/// configuration error.
pub(crate) fn list_folder(folder: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let glob = compile_pattern(pattern)?;
    if !folder.is_dir() {
        log::warn!("Image folder {:?} does not exist, no images listed", folder);
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| glob.matches_with(name, MATCH_OPTIONS))
        })
        .collect();

    // Sort by filename for consistent ordering
    paths.sort();

    log::info!(
        "Listed folder {:?} with pattern '{}': found {} images",
        folder,
        pattern,
        paths.len()
    );
    Ok(paths)
}
