//! Query construction from persona and job text.

use std::collections::BTreeMap;

use crate::text::tokenize;

/// Term weights for the two query sources.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Weight of terms from the job-to-be-done
    pub job_weight: f32,

    /// Weight of terms from the persona description
    pub persona_weight: f32,
}

impl QueryOptions {
    /// Create new query options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the job term weight.
    pub fn with_job_weight(mut self, weight: f32) -> Self {
        self.job_weight = weight;
        self
    }

    /// Set the persona term weight.
    pub fn with_persona_weight(mut self, weight: f32) -> Self {
        self.persona_weight = weight;
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            job_weight: 1.0,
            persona_weight: 0.5,
        }
    }
}

/// Normalized query terms with their weights.
///
/// A term found in both sources keeps the larger weight. Frequency within a
/// source does not matter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRepresentation {
    terms: BTreeMap<String, f32>,
}

impl QueryRepresentation {
    /// Weight of `term`, or 0 when it is not part of the query.
    pub fn weight(&self, term: &str) -> f32 {
        self.terms.get(term).copied().unwrap_or(0.0)
    }

    /// Whether `term` is part of the query.
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Terms and weights in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.terms.iter().map(|(t, &w)| (t.as_str(), w))
    }

    /// Number of distinct terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the query has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Builds a [`QueryRepresentation`].
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    options: QueryOptions,
}

impl QueryBuilder {
    /// Create a builder.
    pub fn new(options: QueryOptions) -> Self {
        Self { options }
    }

    /// Build the query for a persona and job.
    pub fn build(&self, persona: &str, job: &str) -> QueryRepresentation {
        let mut terms = BTreeMap::new();
        let sources = [
            (job, self.options.job_weight),
            (persona, self.options.persona_weight),
        ];
        for (text, weight) in sources {
            for term in tokenize(text) {
                let entry = terms.entry(term).or_insert(weight);
                *entry = entry.max(weight);
            }
        }
        log::debug!("query has {} term(s)", terms.len());
        QueryRepresentation { terms }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_weights() {
        let query = QueryBuilder::default().build(
            "Travel Planner",
            "Plan a trip of 4 days for a group of 10 college friends.",
        );

        assert_eq!(query.weight("trip"), 1.0);
        assert_eq!(query.weight("travel"), 0.5);
        assert_eq!(query.weight("planner"), 0.5);
        assert_eq!(query.weight("of"), 0.0);
        assert!(!query.contains("a"));
    }

    #[test]
    fn test_overlap_keeps_max_weight() {
        let query = QueryBuilder::default().build("menu planning", "planning a menu menu");
        assert_eq!(query.len(), 2);
        assert_eq!(query.weight("menu"), 1.0);
        assert_eq!(query.weight("planning"), 1.0);
    }

    #[test]
    fn test_persona_weight_can_exceed_job() {
        let options = QueryOptions::new().with_persona_weight(2.0);
        let query = QueryBuilder::new(options).build("chef", "chef dinner");
        assert_eq!(query.weight("chef"), 2.0);
        assert_eq!(query.weight("dinner"), 1.0);
    }

    #[test]
    fn test_stop_words_only() {
        let query = QueryBuilder::default().build("", "the of and");
        assert!(query.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let builder = QueryBuilder::default();
        let a = builder.build("HR professional", "Create fillable forms");
        let b = builder.build("HR professional", "Create fillable forms");
        assert_eq!(a, b);
        let terms: Vec<_> = a.iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["create", "fillable", "forms", "hr", "professional"]);
    }
}
