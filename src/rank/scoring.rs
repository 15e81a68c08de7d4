//! Section scoring.

use crate::model::Section;
use crate::query::QueryRepresentation;
use crate::text::term_set;

/// Scores text against a query. Implementations must be deterministic.
pub trait Scorer: Send + Sync {
    /// Score a whole section.
    fn score_section(&self, query: &QueryRepresentation, section: &Section) -> f32;

    /// Score a piece of body text on its own.
    fn score_text(&self, query: &QueryRepresentation, text: &str) -> f32;
}

/// Weights and length pivots of [`LexicalScorer`].
#[derive(Debug, Clone)]
pub struct ScoringWeights {
    /// Multiplier for heading overlap
    pub heading_weight: f32,

    /// Multiplier for body overlap
    pub body_weight: f32,

    /// Heading length (in terms) at which dampening reaches ln 2
    pub heading_pivot: f32,

    /// Body length (in terms) at which dampening reaches ln 2
    pub body_pivot: f32,
}

impl ScoringWeights {
    /// Set heading and body multipliers.
    pub fn with_weights(mut self, heading: f32, body: f32) -> Self {
        self.heading_weight = heading;
        self.body_weight = body;
        self
    }

    /// Set the length pivots.
    pub fn with_pivots(mut self, heading: f32, body: f32) -> Self {
        self.heading_pivot = heading.max(f32::EPSILON);
        self.body_pivot = body.max(f32::EPSILON);
        self
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            heading_weight: 3.0,
            body_weight: 1.0,
            heading_pivot: 8.0,
            body_pivot: 120.0,
        }
    }
}

/// Weighted term overlap, dampened by text length.
///
/// ```text
/// overlap(text)  = sum of weights of distinct query terms in text
/// damp(n, pivot) = 1 / (1 + ln(1 + n / pivot))
/// score          = hw * overlap(heading) * damp(heading)
///                + bw * overlap(body) * damp(body)
/// ```
#[derive(Debug, Clone, Default)]
pub struct LexicalScorer {
    weights: ScoringWeights,
}

impl LexicalScorer {
    /// Create a scorer.
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Weights in use.
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    fn dampened_overlap(query: &QueryRepresentation, text: &str, pivot: f32) -> f32 {
        let (terms, total) = term_set(text);
        let overlap: f32 = terms.iter().map(|t| query.weight(t)).sum();
        if overlap == 0.0 {
            return 0.0;
        }
        overlap * damp(total, pivot)
    }
}

fn damp(terms: usize, pivot: f32) -> f32 {
    1.0 / (1.0 + (1.0 + terms as f32 / pivot).ln())
}

impl Scorer for LexicalScorer {
    fn score_section(&self, query: &QueryRepresentation, section: &Section) -> f32 {
        let w = &self.weights;
        w.heading_weight * Self::dampened_overlap(query, &section.heading, w.heading_pivot)
            + w.body_weight * Self::dampened_overlap(query, &section.body, w.body_pivot)
    }

    fn score_text(&self, query: &QueryRepresentation, text: &str) -> f32 {
        self.weights.body_weight * Self::dampened_overlap(query, text, self.weights.body_pivot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryBuilder;

    fn section(heading: &str, body: &str) -> Section {
        Section {
            document_id: "a.pdf".to_string(),
            index: 0,
            heading: heading.to_string(),
            level: 1,
            page: 1,
            end_page: 1,
            body: body.to_string(),
            parent: None,
            runs: 0..1,
            synthetic: false,
        }
    }

    #[test]
    fn test_damp() {
        assert_eq!(damp(0, 8.0), 1.0);
        assert!(damp(8, 8.0) < 1.0);
        assert!(damp(800, 8.0) < damp(8, 8.0));
    }

    #[test]
    fn test_heading_dominates_body() {
        let query = QueryBuilder::default().build("", "budget");
        let scorer = LexicalScorer::default();

        let in_heading = scorer.score_section(&query, &section("Budget", "Numbers follow."));
        let in_body = scorer.score_section(&query, &section("Numbers", "The budget follows."));
        assert!(in_heading > in_body);
        assert!(in_body > 0.0);
    }

    #[test]
    fn test_distinct_terms_count_once() {
        let query = QueryBuilder::default().build("", "budget");
        let scorer = LexicalScorer::default();
        let once = scorer.score_text(&query, "budget");
        assert!(once > 0.9 && once <= 1.0);
        assert!(scorer.score_text(&query, "budget budget budget") <= once);
    }

    #[test]
    fn test_no_overlap_scores_zero() {
        let query = QueryBuilder::default().build("", "quantum chromodynamics");
        let scorer = LexicalScorer::default();
        assert_eq!(
            scorer.score_section(&query, &section("Recipes", "Bake the bread.")),
            0.0
        );
    }
}
