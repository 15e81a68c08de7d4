//! Cross-document ranking.

use rayon::prelude::*;
use serde::Serialize;

use crate::model::{ParsedDocument, Section};
use crate::query::QueryRepresentation;

use super::scoring::{LexicalScorer, Scorer};

/// Ranking options.
#[derive(Debug, Clone)]
pub struct RankOptions {
    /// Number of sections carried forward to refinement
    pub top_k: usize,
}

impl RankOptions {
    /// Create new rank options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set K.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

impl Default for RankOptions {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// A scored section with its position in the global order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedSection {
    pub document_id: String,
    pub heading: String,
    pub page: u32,
    pub score: f32,
    /// 1-based position in the ranking
    pub rank: usize,
    /// Position of the owning document in the input
    pub document_index: usize,
    /// Position of the section within its document
    pub section_index: usize,
}

impl RankedSection {
    /// Look up the ranked section in the documents it was ranked from.
    pub fn section<'a>(&self, documents: &'a [ParsedDocument]) -> Option<&'a Section> {
        documents
            .get(self.document_index)?
            .sections
            .get(self.section_index)
    }
}

/// Every section of every document, best first.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    sections: Vec<RankedSection>,
    top_k: usize,
}

impl Ranking {
    /// The full ranked sequence.
    pub fn all(&self) -> &[RankedSection] {
        &self.sections
    }

    /// The first K entries.
    pub fn top_k(&self) -> &[RankedSection] {
        &self.sections[..self.top_k.min(self.sections.len())]
    }

    /// Number of ranked sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether nothing was ranked.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Ranks sections from a batch of documents against one query.
#[derive(Debug, Clone)]
pub struct RelevanceRanker<S = LexicalScorer> {
    scorer: S,
    options: RankOptions,
}

impl RelevanceRanker {
    /// Create a ranker with the default lexical scorer.
    pub fn new(options: RankOptions) -> Self {
        Self {
            scorer: LexicalScorer::default(),
            options,
        }
    }
}

impl Default for RelevanceRanker {
    fn default() -> Self {
        Self::new(RankOptions::default())
    }
}

impl<S: Scorer> RelevanceRanker<S> {
    /// Create a ranker with a custom scorer.
    pub fn with_scorer(scorer: S, options: RankOptions) -> Self {
        Self { scorer, options }
    }

    /// Scorer in use.
    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Score and order every section of `documents`.
    ///
    /// Ties are broken by document order, then section order, so the
    /// result does not depend on how scoring was scheduled.
    pub fn rank(&self, query: &QueryRepresentation, documents: &[ParsedDocument]) -> Ranking {
        if query.is_empty() {
            log::warn!("query has no usable terms; every section scores zero");
        }

        let pool: Vec<(usize, &Section)> = documents
            .iter()
            .enumerate()
            .flat_map(|(d, doc)| doc.sections.iter().map(move |s| (d, s)))
            .collect();

        let mut ranked: Vec<RankedSection> = pool
            .par_iter()
            .map(|&(document_index, section)| RankedSection {
                document_id: section.document_id.clone(),
                heading: section.heading.clone(),
                page: section.page,
                score: if query.is_empty() {
                    0.0
                } else {
                    self.scorer.score_section(query, section)
                },
                rank: 0,
                document_index,
                section_index: section.index,
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.document_index.cmp(&b.document_index))
                .then(a.section_index.cmp(&b.section_index))
        });
        for (i, r) in ranked.iter_mut().enumerate() {
            r.rank = i + 1;
        }

        log::info!(
            "ranked {} section(s) from {} document(s)",
            ranked.len(),
            documents.len()
        );
        Ranking {
            sections: ranked,
            top_k: self.options.top_k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryBuilder;

    fn section(doc: &str, index: usize, heading: &str, body: &str) -> Section {
        Section {
            document_id: doc.to_string(),
            index,
            heading: heading.to_string(),
            level: 1,
            page: 1,
            end_page: 1,
            body: body.to_string(),
            parent: None,
            runs: index..index + 1,
            synthetic: false,
        }
    }

    fn parsed(id: &str, sections: Vec<Section>) -> ParsedDocument {
        ParsedDocument {
            id: id.to_string(),
            title: id.to_string(),
            page_count: 1,
            sections,
        }
    }

    fn two_documents() -> Vec<ParsedDocument> {
        vec![
            parsed(
                "a.pdf",
                vec![
                    section("a.pdf", 0, "Introduction", "Why this study exists."),
                    section("a.pdf", 1, "Method", "How the samples were taken."),
                ],
            ),
            parsed(
                "b.pdf",
                vec![section("b.pdf", 0, "Results", "What was observed.")],
            ),
        ]
    }

    #[test]
    fn test_method_and_results_lead() {
        let docs = two_documents();
        let query = QueryBuilder::default().build("", "method results");
        let ranking = RelevanceRanker::new(RankOptions::new().with_top_k(2)).rank(&query, &docs);

        assert_eq!(ranking.len(), 3);
        let top: Vec<_> = ranking.top_k().iter().map(|r| r.heading.as_str()).collect();
        assert!(top.contains(&"Method"));
        assert!(top.contains(&"Results"));
        assert_eq!(ranking.all()[2].heading, "Introduction");
        assert_eq!(ranking.all()[2].rank, 3);
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let docs = two_documents();
        let query = QueryBuilder::default().build("researcher", "method results study");
        let ranker = RelevanceRanker::default();

        let first = ranker.rank(&query, &docs);
        let second = ranker.rank(&query, &docs);
        assert_eq!(first.all(), second.all());
    }

    #[test]
    fn test_no_overlap_keeps_input_order() {
        let docs = two_documents();
        let query = QueryBuilder::default().build("", "astronomy telescopes");
        let ranking = RelevanceRanker::default().rank(&query, &docs);

        let order: Vec<_> = ranking
            .all()
            .iter()
            .map(|r| (r.document_index, r.section_index, r.score))
            .collect();
        assert_eq!(order, vec![(0, 0, 0.0), (0, 1, 0.0), (1, 0, 0.0)]);
    }

    #[test]
    fn test_empty_query_degenerates() {
        let docs = two_documents();
        let query = QueryBuilder::default().build("", "");
        let ranking = RelevanceRanker::default().rank(&query, &docs);
        assert!(ranking.all().iter().all(|r| r.score == 0.0));
        assert_eq!(ranking.all()[0].heading, "Introduction");
    }

    #[test]
    fn test_top_k_is_prefix() {
        let docs = two_documents();
        let query = QueryBuilder::default().build("", "results");
        let ranking = RelevanceRanker::new(RankOptions::new().with_top_k(10)).rank(&query, &docs);

        assert_eq!(ranking.top_k().len(), 3);
        assert_eq!(ranking.top_k(), &ranking.all()[..3]);

        let ranked = &ranking.all()[0];
        assert_eq!(ranked.section(&docs).map(|s| s.heading.as_str()), Some("Results"));
    }
}
