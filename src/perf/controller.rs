//! Resource-accounted batch execution.
//!
//! Documents are handed to a fixed number of worker threads over a bounded
//! channel. Each worker streams one document at a time through the
//! structural parser and reports a [`DocumentOutcome`] back; a sampler
//! thread polls memory until the last outcome arrives.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, unbounded, RecvTimeoutError};

use crate::error::Result;
use crate::model::{document_id, Outline, ParsedDocument};
use crate::parser::{ParseOptions, PdfProvider, SourceProvider, StructuralParser};

use super::memory::{MemorySampler, ProcessMemory};
use super::report::{DocumentMeasurement, PerformanceReport};
use super::state::{DocumentRun, DocumentState};

/// Controller configuration.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Documents processed at the same time
    pub max_concurrent_documents: usize,

    /// Memory ceiling in MB
    pub memory_ceiling_mb: f64,

    /// Time-per-page ceiling in seconds
    pub max_secs_per_page: f64,

    /// How often the memory sampler is polled
    pub sample_interval: Duration,

    /// Documents slower than this are logged, if short enough
    pub slow_document_secs: f64,

    /// Page count up to which the slow-document warning applies
    pub slow_document_pages: u32,

    pub parse: ParseOptions,
}

impl ControllerConfig {
    /// Create new controller configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the worker count (at least 1).
    pub fn with_max_concurrent_documents(mut self, n: usize) -> Self {
        self.max_concurrent_documents = n.max(1);
        self
    }

    /// Set the memory ceiling.
    pub fn with_memory_ceiling_mb(mut self, mb: f64) -> Self {
        self.memory_ceiling_mb = mb;
        self
    }

    /// Set the time-per-page ceiling.
    pub fn with_max_secs_per_page(mut self, secs: f64) -> Self {
        self.max_secs_per_page = secs;
        self
    }

    /// Set the memory sampling interval.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    /// Set parse options.
    pub fn with_parse_options(mut self, parse: ParseOptions) -> Self {
        self.parse = parse;
        self
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 2,
            memory_ceiling_mb: 200.0,
            max_secs_per_page: 0.2,
            sample_interval: Duration::from_millis(50),
            slow_document_secs: 10.0,
            slow_document_pages: 50,
            parse: ParseOptions::default(),
        }
    }
}

/// What happened to one document of the batch.
#[derive(Debug)]
pub struct DocumentOutcome {
    /// Position in the input
    pub index: usize,
    pub path: PathBuf,
    /// States visited, ending in `Finalized` or `Failed`
    pub history: Vec<DocumentState>,
    pub measurement: DocumentMeasurement,
    /// The outline, or why the document failed
    pub result: Result<Outline>,
}

impl DocumentOutcome {
    /// Final state.
    pub fn state(&self) -> DocumentState {
        self.measurement.state
    }

    /// Document identifier.
    pub fn document(&self) -> &str {
        &self.measurement.document
    }
}

/// Outcomes in input order plus the batch report.
#[derive(Debug)]
pub struct BatchResult {
    pub outcomes: Vec<DocumentOutcome>,
    pub report: PerformanceReport,
}

/// Runs performance-mode batches.
pub struct ExecutionController<M = ProcessMemory> {
    config: ControllerConfig,
    sampler: M,
}

impl ExecutionController {
    /// Create a controller sampling process RSS.
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            sampler: ProcessMemory,
        }
    }
}

impl<M: MemorySampler> ExecutionController<M> {
    /// Create a controller with a custom memory sampler.
    pub fn with_sampler(config: ControllerConfig, sampler: M) -> Self {
        Self { config, sampler }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Process PDFs from disk.
    pub fn run(&self, paths: &[PathBuf]) -> BatchResult {
        self.run_with(&PdfProvider, paths, |_| {})
    }

    /// Process documents from `provider`, calling `on_done` on the
    /// controller thread as each document completes.
    pub fn run_with<P, F>(&self, provider: &P, paths: &[PathBuf], mut on_done: F) -> BatchResult
    where
        P: SourceProvider,
        F: FnMut(&DocumentOutcome),
    {
        let workers = self.config.max_concurrent_documents.max(1);
        let parser = StructuralParser::new(self.config.parse.clone());
        log::info!(
            "processing {} document(s) with {} worker(s)",
            paths.len(),
            workers
        );

        let started = Instant::now();
        self.sampler.reset_peak();
        let mut peak = self.sample();
        let mut outcomes = Vec::with_capacity(paths.len());

        let (job_tx, job_rx) = bounded::<(usize, &Path)>(workers);
        let (result_tx, result_rx) = unbounded::<DocumentOutcome>();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        thread::scope(|scope| {
            let sampler = scope.spawn(|| {
                let mut peak = 0.0_f64;
                loop {
                    if let Some(mb) = self.sampler.current_mb() {
                        peak = peak.max(mb);
                    }
                    match stop_rx.recv_timeout(self.config.sample_interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
                peak
            });

            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let parser = &parser;
                scope.spawn(move || {
                    for (index, path) in job_rx {
                        let outcome = self.process(provider, parser, index, path);
                        if result_tx.send(outcome).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            scope.spawn(move || {
                for (index, path) in paths.iter().enumerate() {
                    if job_tx.send((index, path.as_path())).is_err() {
                        break;
                    }
                }
            });

            for outcome in result_rx {
                on_done(&outcome);
                outcomes.push(outcome);
            }

            let _ = stop_tx.send(());
            peak = peak.max(sampler.join().unwrap_or(0.0));
        });

        peak = peak.max(self.sample());
        if let Some(high_water) = self.sampler.peak_mb() {
            peak = peak.max(high_water);
        }
        let elapsed = started.elapsed();

        outcomes.sort_by_key(|o| o.index);
        let measurements: Vec<DocumentMeasurement> =
            outcomes.iter().map(|o| o.measurement.clone()).collect();
        let report = PerformanceReport::new(
            elapsed,
            peak,
            &measurements,
            self.config.memory_ceiling_mb,
            self.config.max_secs_per_page,
        );
        log::info!(
            "{}/{} document(s) finalized in {:.2}s",
            report.documents_finalized,
            paths.len(),
            report.elapsed_secs
        );

        BatchResult { outcomes, report }
    }

    fn sample(&self) -> f64 {
        self.sampler.current_mb().unwrap_or(0.0)
    }

    fn process<P: SourceProvider>(
        &self,
        provider: &P,
        parser: &StructuralParser,
        index: usize,
        path: &Path,
    ) -> DocumentOutcome {
        let started = Instant::now();
        let document = document_id(path);
        let mut run = DocumentRun::new();

        let result = stream_document(provider, parser, path, &mut run);
        if let Err(e) = &result {
            log::warn!("{} failed: {}", document, e);
            if let Err(e) = run.fail() {
                log::error!("{}: {}", document, e);
            }
        }
        let elapsed = started.elapsed();
        let pages = result.as_ref().map_or(0, |p| p.page_count);

        if elapsed.as_secs_f64() > self.config.slow_document_secs
            && pages <= self.config.slow_document_pages
        {
            log::warn!(
                "{} took {:.1}s for {} page(s)",
                document,
                elapsed.as_secs_f64(),
                pages
            );
        }

        DocumentOutcome {
            index,
            path: path.to_path_buf(),
            history: run.history().to_vec(),
            measurement: DocumentMeasurement {
                document,
                state: run.state(),
                pages,
                elapsed,
            },
            result: result.map(|p| p.outline()),
        }
    }
}

/// Drive one document through its lifecycle. Only the returned value
/// outlives the page source.
fn stream_document<P: SourceProvider>(
    provider: &P,
    parser: &StructuralParser,
    path: &Path,
    run: &mut DocumentRun,
) -> Result<ParsedDocument> {
    run.transition(DocumentState::Opening)?;
    let source = provider.open(path)?;
    run.transition(DocumentState::StreamingPages)?;
    let parsed = parser.parse(&source)?;
    run.transition(DocumentState::Finalized)?;
    Ok(parsed)
}
