//! Structural parsing options.

/// Options for structural parsing.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// What to do when a page fails to decode
    pub error_mode: ErrorMode,

    /// Maximum number of heading levels to infer
    pub max_levels: u8,

    /// A size is a heading candidate at or above `body * ratio`
    pub min_heading_ratio: f32,

    /// Neighbouring candidate sizes further apart than `body * ratio`
    /// start a new level
    pub cluster_gap_ratio: f32,

    /// Longest line, in words, still considered visually isolated
    pub max_heading_words: usize,

    /// Longest line, in characters, still considered visually isolated
    pub max_heading_chars: usize,

    /// Above this share of heading runs the layout counts as ambiguous
    /// and all levels are flattened to 1
    pub max_heading_density: f32,

    /// Vertical gap, as a multiple of the typical leading, that starts a
    /// new paragraph inside a section body
    pub paragraph_gap_ratio: f32,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Skip undecodable pages instead of failing the document.
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Set the maximum number of heading levels (at least 1).
    pub fn with_max_levels(mut self, levels: u8) -> Self {
        self.max_levels = levels.max(1);
        self
    }

    /// Set the heading candidate ratio.
    pub fn with_min_heading_ratio(mut self, ratio: f32) -> Self {
        self.min_heading_ratio = ratio;
        self
    }

    /// Set the cluster gap ratio.
    pub fn with_cluster_gap_ratio(mut self, ratio: f32) -> Self {
        self.cluster_gap_ratio = ratio;
        self
    }

    /// Set the ambiguity threshold.
    pub fn with_max_heading_density(mut self, density: f32) -> Self {
        self.max_heading_density = density;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            max_levels: 3,
            min_heading_ratio: 1.15,
            cluster_gap_ratio: 0.08,
            max_heading_words: 12,
            max_heading_chars: 120,
            max_heading_density: 0.6,
            paragraph_gap_ratio: 1.5,
        }
    }
}

/// Error handling mode for page decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// A page that fails to decode fails the whole document
    #[default]
    Strict,
    /// Undecodable pages are logged and skipped
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .lenient()
            .with_max_levels(0)
            .with_min_heading_ratio(1.3);

        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert_eq!(options.max_levels, 1);
        assert_eq!(options.min_heading_ratio, 1.3);
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert_eq!(options.max_levels, 3);
    }
}
