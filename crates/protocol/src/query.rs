//! Typed shapes returned by in-page lookups.
//!
//! Every DOM query the automation layer performs comes back as one of these
//! structs rather than an ad-hoc JSON blob, so callers and test doubles agree
//! on the exact contract.

use serde::{Deserialize, Serialize};

/// Identifies a frame by its position in the page's attachment order.
///
/// Index 0 is always the top-level document. Frames are transient; an id is
/// only meaningful for the scan that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub usize);

/// One attached frame: its id plus the URL it reported at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameInfo {
    pub id: FrameId,
    pub url: String,
}

/// What kind of form control an element is, for fill dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Text,
    Textarea,
    Select,
    Checkbox,
}

/// Result of locating an element by its visible text: the center of its
/// bounding box and whether the element is marked disabled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextHit {
    pub x: f64,
    pub y: f64,
    pub disabled: bool,
}

/// A table lifted out of a frame: header texts plus body rows of cell texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Index of the column whose header equals `name`, if any.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_is_exact() {
        let table = TableData {
            headers: vec!["Date".into(), "Provider".into()],
            rows: vec![],
        };
        assert_eq!(table.column("Provider"), Some(1));
        assert_eq!(table.column("provider"), None);
    }
}
