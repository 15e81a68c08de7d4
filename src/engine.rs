//! Persona-mode orchestration.
//!
//! Parses a batch of documents with bounded parallelism, ranks every
//! section against the persona's query, refines the top sections and
//! assembles the [`Digest`]. Per-document failures are recorded and
//! skipped; the run only fails when no document survives.

use std::path::Path;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::input::{JobSpec, ResolvedDocument};
use crate::model::ParsedDocument;
use crate::output::{Digest, DigestMetadata, SkippedDocument};
use crate::parser::{ParseOptions, PdfProvider, SourceProvider, StructuralParser};
use crate::query::{QueryBuilder, QueryOptions};
use crate::rank::{LexicalScorer, RankOptions, Ranking, RelevanceRanker, ScoringWeights};
use crate::refine::{RefineOptions, SubsectionRefiner, SubsectionResult};

/// Options for a persona-mode run.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Documents parsed at the same time
    pub max_concurrent_documents: usize,

    pub parse: ParseOptions,
    pub query: QueryOptions,
    pub scoring: ScoringWeights,
    pub rank: RankOptions,
    pub refine: RefineOptions,
}

impl EngineOptions {
    /// Create new engine options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the parsing concurrency (at least 1).
    pub fn with_max_concurrent_documents(mut self, n: usize) -> Self {
        self.max_concurrent_documents = n.max(1);
        self
    }

    /// Set K.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.rank.top_k = top_k;
        self
    }

    /// Set parse options.
    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }

    /// Set scoring weights.
    pub fn with_scoring(mut self, scoring: ScoringWeights) -> Self {
        self.scoring = scoring;
        self
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 2,
            parse: ParseOptions::default(),
            query: QueryOptions::default(),
            scoring: ScoringWeights::default(),
            rank: RankOptions::default(),
            refine: RefineOptions::default(),
        }
    }
}

/// Outcome of parsing a batch.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    /// Successfully parsed documents, in input order
    pub documents: Vec<ParsedDocument>,

    /// Documents that could not be used
    pub skipped: Vec<SkippedDocument>,
}

/// Runs persona-mode analyses.
#[derive(Debug, Clone, Default)]
pub struct PersonaEngine {
    options: EngineOptions,
}

impl PersonaEngine {
    /// Create an engine.
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// Options in use.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Analyze the PDFs named by `spec`, resolving them against `base_dir`.
    pub fn analyze(&self, spec: &JobSpec, base_dir: &Path) -> Result<Digest> {
        self.analyze_with(&PdfProvider, spec, base_dir)
    }

    /// Analyze with a custom document provider.
    pub fn analyze_with<P: SourceProvider>(
        &self,
        provider: &P,
        spec: &JobSpec,
        base_dir: &Path,
    ) -> Result<Digest> {
        spec.validate()?;

        let (documents, missing) = spec.resolve_documents(base_dir);
        let mut skipped: Vec<SkippedDocument> = missing
            .into_iter()
            .map(|(name, e)| {
                log::warn!("skipping {}: {}", name, e);
                SkippedDocument::new(name, &e)
            })
            .collect();
        if documents.is_empty() {
            return Err(Error::NoValidDocuments);
        }

        let batch = self.parse_batch(provider, &documents)?;
        skipped.extend(batch.skipped);
        if batch.documents.is_empty() {
            return Err(Error::NoValidDocuments);
        }
        log::info!(
            "{} of {} document(s) parsed",
            batch.documents.len(),
            spec.documents.len()
        );

        let (ranking, refined) =
            self.rank_documents(&batch.documents, &spec.persona, &spec.job_to_be_done);

        let metadata = DigestMetadata::now(
            spec.documents.iter().map(|d| d.filename.clone()).collect(),
            &spec.persona,
            &spec.job_to_be_done,
        );
        Ok(Digest::new(metadata, ranking.top_k(), &refined, skipped))
    }

    /// Parse documents with at most `max_concurrent_documents` in flight.
    ///
    /// Documents and their sections are reported under the resolved name.
    /// Document-level failures are recorded in [`ParsedBatch::skipped`];
    /// any other error aborts the batch.
    pub fn parse_batch<P: SourceProvider>(
        &self,
        provider: &P,
        documents: &[ResolvedDocument],
    ) -> Result<ParsedBatch> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.max_concurrent_documents.max(1))
            .build()
            .map_err(|e| Error::Other(format!("cannot start parser pool: {}", e)))?;
        let parser = StructuralParser::new(self.options.parse.clone());

        let results: Vec<Result<ParsedDocument>> = pool.install(|| {
            documents
                .par_iter()
                .map(|doc| {
                    let source = provider.open(&doc.path)?;
                    parser.parse(&source)
                })
                .collect()
        });

        let mut batch = ParsedBatch::default();
        for (doc, result) in documents.iter().zip(results) {
            match result {
                Ok(parsed) => batch.documents.push(parsed.with_id(doc.name.as_str())),
                Err(e) if !e.is_document_level() => return Err(e),
                Err(e) => {
                    log::warn!("skipping {}: {}", doc.name, e);
                    batch.skipped.push(SkippedDocument::new(doc.name.clone(), &e));
                }
            }
        }
        Ok(batch)
    }

    /// Rank already-parsed documents and refine the top sections.
    pub fn rank_documents(
        &self,
        documents: &[ParsedDocument],
        persona: &str,
        job: &str,
    ) -> (Ranking, Vec<SubsectionResult>) {
        let query = QueryBuilder::new(self.options.query.clone()).build(persona, job);
        let ranker = RelevanceRanker::with_scorer(
            LexicalScorer::new(self.options.scoring.clone()),
            self.options.rank.clone(),
        );
        let ranking = ranker.rank(&query, documents);
        let refined = SubsectionRefiner::new(self.options.refine.clone()).refine(
            ranker.scorer(),
            &query,
            ranking.top_k(),
            documents,
        );
        (ranking, refined)
    }
}
