//! Where the label catalog comes from.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};

/// Source of the fixed vocabulary of permissible labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LabelSource {
    /// Labels given directly
    Inline {
        /// The labels, in display order
        labels: Vec<String>,
    },
    /// A JSON file holding a flat array of strings
    JsonFile {
        /// Path to the file
        path: PathBuf,
    },
    /// A text file with one label per line
    TextFile {
        /// Path to the file
        path: PathBuf,
    },
}

impl LabelSource {
    /// Inline catalog.
    pub fn inline<S: Into<String>>(labels: impl IntoIterator<Item = S>) -> Self {
        Self::Inline {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Read and validate the catalog.
    ///
    /// Returns labels in source order with duplicates removed (first
    /// occurrence wins). Malformed file contents are an error.
    pub fn resolve(&self) -> Result<Vec<String>> {
        let labels = match self {
            LabelSource::Inline { labels } => labels.clone(),
            LabelSource::JsonFile { path } => read_json_labels(path)?,
            LabelSource::TextFile { path } => read_text_labels(path)?,
        };
        Ok(dedup_labels(labels))
    }
}

fn read_json_labels(path: &Path) -> Result<Vec<String>> {
    let json = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&json)
        .map_err(|e| AnnotateError::label_source(path, format!("not valid JSON: {}", e)))?;

    let items = value.as_array().ok_or_else(|| {
        AnnotateError::label_source(path, "JSON file must contain a list of strings")
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str().map(str::to_string).ok_or_else(|| {
                AnnotateError::label_source(
                    path,
                    format!("JSON file must contain a list of strings, found {}", item),
                )
            })
        })
        .collect()
}

fn read_text_labels(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn dedup_labels(labels: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(labels.len());
    for label in labels {
        if unique.contains(&label) {
            log::warn!("Duplicate label '{}' ignored", label);
        } else {
            unique.push(label);
        }
    }
    unique
}
