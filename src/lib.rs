//! # docsift
//!
//! Persona-driven section ranking and outline extraction for PDF documents.
//!
//! Given a batch of PDFs, a persona and a job-to-be-done, docsift infers
//! each document's heading structure from font metrics, ranks every section
//! against the persona's task, and extracts the most relevant passage of
//! the best sections. A performance mode extracts outlines under time and
//! memory accounting.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docsift::{analyze, JobSpec, JsonFormat};
//! use std::path::Path;
//!
//! fn main() -> docsift::Result<()> {
//!     let spec = JobSpec::from_path("input/job.json")?;
//!     let digest = analyze(&spec, Path::new("input"))?;
//!     println!("{}", digest.to_json(JsonFormat::Pretty)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Relative heading inference**: font-size clustering against the body size
//! - **Streaming parse**: one decoded page alive at a time
//! - **Deterministic ranking**: stable tie-break on document and section order
//! - **Bounded batches**: fixed parallelism, memory sampling, compliance report

pub mod detect;
pub mod engine;
pub mod error;
pub mod input;
pub mod model;
pub mod output;
pub mod parser;
pub mod perf;
pub mod query;
pub mod rank;
pub mod refine;
pub mod text;

// Re-export commonly used types
pub use detect::{is_pdf_bytes, pdf_version_from_bytes, pdf_version_from_path};
pub use engine::{EngineOptions, PersonaEngine};
pub use error::{Error, Result};
pub use input::{pdf_files_in, JobSpec, ResolvedDocument};
pub use model::{Document, Outline, OutlineEntry, Page, ParsedDocument, Section, TextRun};
pub use output::{Digest, JsonFormat};
pub use parser::{
    HeadingStrategy, LopdfBackend, PageSource, ParseOptions, SourceProvider, StructuralParser,
};
pub use perf::{ControllerConfig, ExecutionController, PerformanceReport};
pub use query::{QueryBuilder, QueryOptions, QueryRepresentation};
pub use rank::{RankOptions, Ranking, RelevanceRanker, Scorer};
pub use refine::{RefineOptions, SubsectionRefiner};

use std::path::Path;

/// Run a persona-mode analysis with default options.
///
/// Document references in `spec` are resolved against `base_dir`.
pub fn analyze(spec: &JobSpec, base_dir: &Path) -> Result<Digest> {
    PersonaEngine::default().analyze(spec, base_dir)
}

/// Parse a PDF file into sections.
///
/// # Example
///
/// ```no_run
/// let parsed = docsift::parse_file("report.pdf").unwrap();
/// for section in &parsed.sections {
///     println!("{} (p. {})", section.heading, section.page);
/// }
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<ParsedDocument> {
    parse_file_with_options(path, ParseOptions::default())
}

/// Parse a PDF file into sections with custom options.
pub fn parse_file_with_options<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<ParsedDocument> {
    let source = LopdfBackend::load_file(path)?;
    StructuralParser::new(options).parse(&source)
}

/// Parse PDF bytes into sections.
pub fn parse_bytes(id: &str, data: &[u8]) -> Result<ParsedDocument> {
    let source = LopdfBackend::load_bytes(id, data)?;
    StructuralParser::default().parse(&source)
}

/// Extract the heading outline of a PDF file.
///
/// # Example
///
/// ```no_run
/// let outline = docsift::extract_outline("report.pdf").unwrap();
/// println!("{}", outline.title);
/// ```
pub fn extract_outline<P: AsRef<Path>>(path: P) -> Result<Outline> {
    Ok(parse_file(path)?.outline())
}
