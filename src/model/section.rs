//! Inferred sections.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A heading plus the text that belongs to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Owning document identifier
    pub document_id: String,

    /// Position of this section in document order (0-based)
    pub index: usize,

    /// Heading text
    pub heading: String,

    /// Heading level (1 = most prominent)
    pub level: u8,

    /// Page the heading starts on (1-indexed)
    pub page: u32,

    /// Last page holding this section's own content
    pub end_page: u32,

    /// Text up to the next heading of equal or higher prominence.
    /// Paragraphs are separated by a blank line.
    pub body: String,

    /// Index of the enclosing section, if any
    pub parent: Option<usize>,

    /// Document-wide ordinals of the runs attributed to this section alone
    /// (heading lines included, nested sections excluded)
    pub runs: Range<usize>,

    /// True when the parser had no heading to anchor this section on
    pub synthetic: bool,
}

impl Section {
    /// Whether the section has no body text.
    pub fn is_body_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    /// Whether this section sits at the top of its document's forest.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_predicates() {
        let section = Section {
            document_id: "a.pdf".to_string(),
            index: 0,
            heading: "Intro".to_string(),
            level: 1,
            page: 1,
            end_page: 1,
            body: "  \n ".to_string(),
            parent: None,
            runs: 0..1,
            synthetic: false,
        };
        assert!(section.is_body_empty());
        assert!(section.is_root());
    }
}
