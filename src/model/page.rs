//! Page-level types.

use serde::{Deserialize, Serialize};

/// One visual line of text with the font metadata heading inference needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Dominant font size in points
    pub font_size: f32,

    /// Whether the run is predominantly set in a bold face
    pub bold: bool,

    /// Whether the run is predominantly set in an italic face
    pub italic: bool,

    /// Base font name of the dominant span (e.g. "Helvetica-Bold")
    pub font_name: String,

    /// Left edge in PDF user space
    pub x: f32,

    /// Baseline in PDF user space (larger = higher on the page)
    pub y: f32,
}

impl TextRun {
    /// Create a regular-weight run.
    pub fn new(text: impl Into<String>, font_size: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            bold: false,
            italic: false,
            font_name: String::new(),
            x: 0.0,
            y,
        }
    }

    /// Create a bold run.
    pub fn bold(text: impl Into<String>, font_size: f32, y: f32) -> Self {
        Self {
            bold: true,
            ..Self::new(text, font_size, y)
        }
    }

    /// Set the font name, deriving style flags from it.
    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        let lower = self.font_name.to_lowercase();
        self.bold |= ["bold", "black", "heavy", "semibold"]
            .iter()
            .any(|k| lower.contains(k));
        self.italic |= lower.contains("italic") || lower.contains("oblique");
        self
    }

    /// Set the left edge.
    pub fn at_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Number of characters, ignoring surrounding whitespace.
    pub fn char_len(&self) -> usize {
        self.text.trim().chars().count()
    }

    /// Number of whitespace-separated words.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    /// Whether the run has no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A single page in reading order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Lines of text in reading order
    pub runs: Vec<TextRun>,
}

impl Page {
    /// Create an empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            runs: Vec::new(),
        }
    }

    /// Create a page from runs.
    pub fn with_runs(number: u32, runs: Vec<TextRun>) -> Self {
        Self { number, runs }
    }

    /// Append a run.
    pub fn push(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    /// First non-empty line, trimmed.
    pub fn first_line(&self) -> Option<&str> {
        self.runs
            .iter()
            .map(|r| r.text.trim())
            .find(|t| !t.is_empty())
    }

    /// Whether the page has no visible text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(TextRun::is_blank)
    }

    /// Plain text of the page, one run per line.
    pub fn plain_text(&self) -> String {
        self.runs
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
