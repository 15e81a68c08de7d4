//! Best-passage selection inside top-ranked sections.

use serde::Serialize;

use crate::model::ParsedDocument;
use crate::query::QueryRepresentation;
use crate::rank::{RankedSection, Scorer};
use crate::text::{collapse_whitespace, split_sentences};

/// Passage splitting options.
#[derive(Debug, Clone)]
pub struct RefineOptions {
    /// Paragraphs longer than this are split into sentence clusters
    pub max_passage_chars: usize,

    /// Sentences per cluster when a paragraph is split
    pub sentences_per_passage: usize,
}

impl RefineOptions {
    /// Create new refine options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the paragraph length limit.
    pub fn with_max_passage_chars(mut self, chars: usize) -> Self {
        self.max_passage_chars = chars;
        self
    }

    /// Set the cluster size (at least 1).
    pub fn with_sentences_per_passage(mut self, sentences: usize) -> Self {
        self.sentences_per_passage = sentences.max(1);
        self
    }
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            max_passage_chars: 600,
            sentences_per_passage: 3,
        }
    }
}

/// The most relevant passage of a ranked section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsectionResult {
    pub document_id: String,
    pub page: u32,
    pub text: String,
    /// Rank of the section the passage was taken from
    pub rank: usize,
}

/// Picks one passage per ranked section.
#[derive(Debug, Clone, Default)]
pub struct SubsectionRefiner {
    options: RefineOptions,
}

impl SubsectionRefiner {
    /// Create a refiner.
    pub fn new(options: RefineOptions) -> Self {
        Self { options }
    }

    /// Refine each ranked section into its best passage.
    ///
    /// Exactly one result is produced per entry of `ranked`, in the same
    /// order.
    pub fn refine<S: Scorer + ?Sized>(
        &self,
        scorer: &S,
        query: &QueryRepresentation,
        ranked: &[RankedSection],
        documents: &[ParsedDocument],
    ) -> Vec<SubsectionResult> {
        ranked
            .iter()
            .map(|r| {
                let text = match r.section(documents) {
                    Some(section) if !section.is_body_empty() => {
                        self.best_passage(scorer, query, &section.body)
                    }
                    Some(section) => section.heading.clone(),
                    None => r.heading.clone(),
                };
                SubsectionResult {
                    document_id: r.document_id.clone(),
                    page: r.page,
                    text,
                    rank: r.rank,
                }
            })
            .collect()
    }

    /// Highest-scoring passage of `body`; the earliest wins ties.
    pub fn best_passage<S: Scorer + ?Sized>(
        &self,
        scorer: &S,
        query: &QueryRepresentation,
        body: &str,
    ) -> String {
        let passages = self.passages(body);
        let mut best: Option<(f32, &String)> = None;
        for passage in &passages {
            let score = scorer.score_text(query, passage);
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, passage));
            }
        }
        match best {
            Some((_, passage)) => passage.clone(),
            None => collapse_whitespace(body),
        }
    }

    /// Split a body into candidate passages.
    pub fn passages(&self, body: &str) -> Vec<String> {
        let mut out = Vec::new();
        for paragraph in body.split("\n\n") {
            let paragraph = collapse_whitespace(paragraph);
            if paragraph.is_empty() {
                continue;
            }
            if paragraph.chars().count() <= self.options.max_passage_chars {
                out.push(paragraph);
                continue;
            }
            let sentences = split_sentences(&paragraph);
            for cluster in sentences.chunks(self.options.sentences_per_passage.max(1)) {
                out.push(cluster.join(" "));
            }
        }
        out
    }
}
