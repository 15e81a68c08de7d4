//! Relevance ranking of sections against a query.

mod ranker;
mod scoring;

pub use ranker::{RankOptions, RankedSection, Ranking, RelevanceRanker};
pub use scoring::{LexicalScorer, Scorer, ScoringWeights};
