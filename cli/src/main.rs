//! docsift CLI - persona-driven PDF section ranking

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use peak_alloc::PeakAlloc;

use docsift::perf::{DocumentState, MemorySampler};
use docsift::{
    parse_file_with_options, pdf_files_in, ControllerConfig, EngineOptions, Error,
    ExecutionController, JobSpec, JsonFormat, ParseOptions, PersonaEngine,
};

#[global_allocator]
static PEAK_ALLOC: PeakAlloc = PeakAlloc;

/// Memory sampler backed by the tracking allocator.
struct AllocatorMemory;

impl MemorySampler for AllocatorMemory {
    fn current_mb(&self) -> Option<f64> {
        Some(PEAK_ALLOC.current_usage_as_mb() as f64)
    }

    fn peak_mb(&self) -> Option<f64> {
        Some(PEAK_ALLOC.peak_usage_as_mb() as f64)
    }

    fn reset_peak(&self) {
        PEAK_ALLOC.reset_peak_usage();
    }
}

#[derive(Parser)]
#[command(name = "docsift")]
#[command(version)]
#[command(about = "Rank PDF sections for a persona's task and extract outlines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank sections of the documents in a job specification
    Analyze {
        /// Job specification (JSON)
        #[arg(value_name = "SPEC")]
        spec: PathBuf,

        /// Directory relative document paths are resolved against
        #[arg(long, value_name = "DIR", env = "DOCSIFT_BASE_DIR")]
        base_dir: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Number of sections to refine
        #[arg(long, default_value = "5", env = "DOCSIFT_TOP_K")]
        top_k: usize,

        /// Documents parsed at the same time
        #[arg(short, long, default_value = "2", env = "DOCSIFT_JOBS")]
        jobs: usize,

        /// Skip undecodable pages instead of failing the document
        #[arg(long)]
        lenient: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Extract outlines under time and memory accounting
    Outline {
        /// PDF file or directory of PDFs
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Directory for the per-document outline files
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Documents processed at the same time
        #[arg(short, long, default_value = "2", env = "DOCSIFT_JOBS")]
        jobs: usize,

        /// Memory ceiling in MB
        #[arg(long, default_value = "200", env = "DOCSIFT_MEMORY_CEILING_MB")]
        memory_ceiling_mb: f64,

        /// Time-per-page ceiling in seconds
        #[arg(long, default_value = "0.2", env = "DOCSIFT_MAX_SECS_PER_PAGE")]
        max_secs_per_page: f64,

        /// Memory sampling interval in milliseconds
        #[arg(long, default_value = "50", env = "DOCSIFT_SAMPLE_INTERVAL_MS")]
        sample_interval_ms: u64,

        /// Also write the performance report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Show the inferred section tree of a PDF
    Sections {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print section bodies too
        #[arg(long)]
        bodies: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Analyze {
            spec,
            base_dir,
            output,
            top_k,
            jobs,
            lenient,
            compact,
        }) => cmd_analyze(
            &spec,
            base_dir.as_deref(),
            output.as_deref(),
            top_k,
            jobs,
            lenient,
            compact,
        ),
        Some(Commands::Outline {
            input,
            output,
            jobs,
            memory_ceiling_mb,
            max_secs_per_page,
            sample_interval_ms,
            report,
        }) => {
            let config = ControllerConfig::new()
                .with_max_concurrent_documents(jobs)
                .with_memory_ceiling_mb(memory_ceiling_mb)
                .with_max_secs_per_page(max_secs_per_page)
                .with_sample_interval(Duration::from_millis(sample_interval_ms));
            cmd_outline(&input, output.as_deref(), config, report.as_deref())
        }
        Some(Commands::Sections { input, bodies }) => cmd_sections(&input, bodies),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            println!("{}", "Usage: docsift <COMMAND>".yellow());
            println!("       docsift --help for more information");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_analyze(
    spec_path: &Path,
    base_dir: Option<&Path>,
    output: Option<&Path>,
    top_k: usize,
    jobs: usize,
    lenient: bool,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = JobSpec::from_path(spec_path)?;
    log::debug!("loaded {}", spec_path.display());
    let base_dir = match base_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };

    let mut parse = ParseOptions::new();
    if lenient {
        parse = parse.lenient();
    }
    let options = EngineOptions::new()
        .with_top_k(top_k)
        .with_max_concurrent_documents(jobs)
        .with_parse_options(parse);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Analyzing {} document(s)...", spec.documents.len()));

    let digest = PersonaEngine::new(options).analyze(&spec, &base_dir);
    spinner.finish_and_clear();
    let digest = digest?;

    for skipped in &digest.skipped_documents {
        eprintln!(
            "{} {}: {}",
            "Skipped".yellow(),
            skipped.document,
            skipped.reason
        );
    }

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = digest.to_json(format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_outline(
    input: &Path,
    output: Option<&Path>,
    config: ControllerConfig,
    report_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let paths = if input.is_dir() {
        pdf_files_in(input)?
    } else {
        vec![input.to_path_buf()]
    };
    if paths.is_empty() {
        return Err(Error::NoValidDocuments.into());
    }

    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;
    log::debug!(
        "writing {} outline(s) to {}",
        paths.len(),
        output_dir.display()
    );

    let pb = ProgressBar::new(paths.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let controller = ExecutionController::with_sampler(config, AllocatorMemory);
    let mut write_error = None;
    let batch = controller.run_with(&docsift::parser::PdfProvider, &paths, |outcome| {
        pb.set_message(outcome.document().to_string());
        pb.inc(1);
        if let Ok(outline) = &outcome.result {
            let stem = outcome
                .path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();
            let written = docsift::output::to_json(outline, JsonFormat::Pretty)
                .map_err(Box::<dyn std::error::Error>::from)
                .and_then(|json| {
                    fs::write(output_dir.join(format!("{}.json", stem)), json).map_err(Into::into)
                });
            if let Err(e) = written {
                write_error.get_or_insert(e);
            }
        }
    });
    pb.finish_and_clear();
    if let Some(e) = write_error {
        return Err(e);
    }

    for outcome in &batch.outcomes {
        match (&outcome.result, outcome.state()) {
            (Ok(outline), DocumentState::Finalized) => println!(
                "  {} {} ({} headings, {:.2}s)",
                "✓".green(),
                outcome.document(),
                outline.entries.len(),
                outcome.measurement.elapsed.as_secs_f64()
            ),
            (Err(e), _) => println!("  {} {}: {}", "✗".red(), outcome.document(), e),
            _ => {}
        }
    }

    let report = &batch.report;
    println!();
    println!("{}", "Performance Report".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}", report);
    if !report.is_compliant() {
        println!("{}", "Ceilings exceeded (advisory)".yellow());
    }

    if let Some(path) = report_path {
        fs::write(path, docsift::output::to_json(report, JsonFormat::Pretty)?)?;
        println!("{} {}", "Report saved to".green(), path.display());
    }

    if report.documents_finalized == 0 {
        return Err(Error::NoValidDocuments.into());
    }
    Ok(())
}

fn cmd_sections(input: &Path, bodies: bool) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_file_with_options(input, ParseOptions::new().lenient())?;

    println!("{}", "Document Sections".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Title".bold(), parsed.title);
    println!("{}: {}", "Pages".bold(), parsed.page_count);
    println!("{}: {}", "Sections".bold(), parsed.sections.len());
    println!();

    for section in &parsed.sections {
        let indent = "  ".repeat(section.level.saturating_sub(1) as usize);
        let label = if section.synthetic {
            "--".dimmed()
        } else {
            format!("H{}", section.level).green()
        };
        println!(
            "{}{} {} {}",
            indent,
            label,
            section.heading.bold(),
            format!("(p. {})", section.page).dimmed()
        );
        if bodies && !section.is_body_empty() {
            for line in section.body.lines() {
                println!("{}     {}", indent, line.dimmed());
            }
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docsift".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Persona-driven PDF section ranking and outline extraction");
    println!();
    println!("License: MIT");
}
