//! Image-level classification labels.

use serde::{Deserialize, Serialize};

/// How many catalog labels may be assigned to one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// Exactly one label per image
    #[default]
    Single,
    /// Any subset of the catalog per image
    Multiple,
}

/// The value part of a label: one class or an ordered set of classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelValue {
    /// A single class
    Single(String),
    /// Several classes, in selection order
    Multiple(Vec<String>),
}

impl LabelValue {
    /// Selection mode this value belongs to.
    pub fn mode(&self) -> SelectionMode {
        match self {
            LabelValue::Single(_) => SelectionMode::Single,
            LabelValue::Multiple(_) => SelectionMode::Multiple,
        }
    }

    /// All class names in this value.
    pub fn values(&self) -> Vec<&str> {
        match self {
            LabelValue::Single(v) => vec![v.as_str()],
            LabelValue::Multiple(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// The single class, if this is a single-select value.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            LabelValue::Single(v) => Some(v),
            LabelValue::Multiple(_) => None,
        }
    }

    /// The class list, if this is a multi-select value.
    pub fn as_multiple(&self) -> Option<&[String]> {
        match self {
            LabelValue::Single(_) => None,
            LabelValue::Multiple(vs) => Some(vs),
        }
    }
}

/// A stored label with provenance.
///
/// Equality compares only the value; timestamp and author are provenance
/// and do not make two labels different.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "LabelEntry", into = "LabelEntry")]
pub struct Label {
    /// The assigned class or classes
    pub value: LabelValue,
    /// Seconds since the Unix epoch when the label was assigned
    pub timestamp: Option<f64>,
    /// Who assigned the label
    pub author: Option<String>,
}

impl Label {
    /// Create a label without provenance.
    pub fn new(value: LabelValue) -> Self {
        Self {
            value,
            timestamp: None,
            author: None,
        }
    }

    /// Create a single-select label.
    pub fn single(value: impl Into<String>) -> Self {
        Self::new(LabelValue::Single(value.into()))
    }

    /// Create a multi-select label.
    pub fn multiple<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(LabelValue::Multiple(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Set the timestamp.
    pub fn with_timestamp(mut self, timestamp: Option<f64>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Set the author.
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

/// On-disk shape of a label: `single` and `multiple` are mutually exclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LabelEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    single: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    multiple: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
}

impl TryFrom<LabelEntry> for Label {
    type Error = String;

    fn try_from(entry: LabelEntry) -> Result<Self, Self::Error> {
        let value = match (entry.single, entry.multiple) {
            (Some(single), None) => LabelValue::Single(single),
            (None, Some(multiple)) => LabelValue::Multiple(multiple),
            (Some(_), Some(_)) => {
                return Err("label has both 'single' and 'multiple' set".to_string());
            }
            (None, None) => return Err("label has neither 'single' nor 'multiple'".to_string()),
        };
        Ok(Self {
            value,
            timestamp: entry.timestamp,
            author: entry.author,
        })
    }
}

impl From<Label> for LabelEntry {
    fn from(label: Label) -> Self {
        let (single, multiple) = match label.value {
            LabelValue::Single(v) => (Some(v), None),
            LabelValue::Multiple(vs) => (None, Some(vs)),
        };
        Self {
            single,
            multiple,
            timestamp: label.timestamp,
            author: label.author,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_provenance() {
        let a = Label::single("cat").with_timestamp(Some(1.0));
        let b = Label::single("cat")
            .with_timestamp(Some(2.0))
            .with_author(Some("ann".into()));
        assert_eq!(a, b);
        assert_ne!(a, Label::single("dog"));
        assert_ne!(Label::single("cat"), Label::multiple(["cat"]));
    }

    #[test]
    fn test_serialize_omits_empty_fields() {
        let json = serde_json::to_value(Label::single("cat")).unwrap();
        assert_eq!(json, serde_json::json!({"single": "cat"}));

        let json = serde_json::to_value(
            Label::multiple(["cat", "dog"]).with_author(Some("ann".into())),
        )
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"multiple": ["cat", "dog"], "author": "ann"})
        );
    }

    #[test]
    fn test_deserialize_rejects_ambiguous_label() {
        let both = r#"{"single": "cat", "multiple": ["dog"]}"#;
        assert!(serde_json::from_str::<Label>(both).is_err());
        assert!(serde_json::from_str::<Label>("{}").is_err());
    }

    #[test]
    fn test_value_accessors() {
        let single = LabelValue::Single("cat".into());
        assert_eq!(single.as_single(), Some("cat"));
        assert_eq!(single.mode(), SelectionMode::Single);

        let multiple = LabelValue::Multiple(vec!["cat".into(), "dog".into()]);
        assert_eq!(multiple.values(), vec!["cat", "dog"]);
        assert!(multiple.as_single().is_none());
        assert_eq!(multiple.mode(), SelectionMode::Multiple);
    }
}
