//! Document-level types.

use super::{Page, Section};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A decoded document held fully in memory.
///
/// Streaming code paths never build one of these; they pull pages from a
/// [`PageSource`](crate::parser::PageSource) instead. The in-memory form is
/// what tests and small embedded callers use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier (file name of the source)
    pub id: String,

    /// Title from the document information dictionary
    pub title: Option<String>,

    /// Pages in order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create an empty document.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            pages: Vec::new(),
        }
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        if page_num == 0 {
            return None;
        }
        self.pages.get((page_num - 1) as usize)
    }

    /// Add a page, numbering it after the last one.
    pub fn add_page(&mut self, mut page: Page) {
        page.number = self.page_count() + 1;
        self.pages.push(page);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Derive the identifier used for a source path: its file name.
pub fn document_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// The structural result of parsing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDocument {
    /// Document identifier
    pub id: String,

    /// Resolved title (metadata, first top-level heading, or id)
    pub title: String,

    /// Number of pages consumed
    pub page_count: u32,

    /// Sections in reading order
    pub sections: Vec<Section>,
}

impl ParsedDocument {
    /// Report the document and its sections under `id`.
    ///
    /// A title that fell back to the old identifier follows the rename.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if self.title == self.id {
            self.title = id.clone();
        }
        for section in &mut self.sections {
            section.document_id = id.clone();
        }
        self.id = id;
        self
    }

    /// Build the outline of this document.
    pub fn outline(&self) -> Outline {
        Outline {
            title: self.title.clone(),
            entries: self
                .sections
                .iter()
                .filter(|s| !s.synthetic)
                .map(|s| OutlineEntry {
                    level: s.level,
                    text: s.heading.clone(),
                    page: s.page,
                })
                .collect(),
        }
    }
}

/// Inferred heading outline of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Document title
    pub title: String,

    /// Heading entries in reading order
    #[serde(rename = "outline")]
    pub entries: Vec<OutlineEntry>,
}

impl Outline {
    /// Check if the outline has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A single heading in an outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// Heading level (1 = most prominent), serialized as "H1", "H2", ...
    #[serde(with = "heading_level")]
    pub level: u8,

    /// Heading text
    pub text: String,

    /// Page the heading starts on (1-indexed)
    pub page: u32,
}

mod heading_level {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(level: &u8, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("H{}", level))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
        let raw = String::deserialize(d)?;
        raw.strip_prefix('H')
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| de::Error::custom(format!("invalid heading level: {}", raw)))
    }
}
