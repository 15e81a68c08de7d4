//! Batch compliance report.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use super::state::DocumentState;

/// Time spent on one document by the worker that handled it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMeasurement {
    pub document: String,
    pub state: DocumentState,
    pub pages: u32,
    pub elapsed: Duration,
}

/// Per-document line of the report.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentTiming {
    pub document: String,
    pub state: DocumentState,
    pub pages: u32,
    /// Worker time spent on the document
    pub elapsed_secs: f64,
    /// Share of the batch wall clock attributed to the document
    pub share_secs: f64,
}

/// Batch measurements checked against the configured ceilings.
///
/// Compliance flags are advisory; a non-compliant batch still completes.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    pub elapsed_secs: f64,
    pub peak_memory_mb: f64,
    /// Pages of finalized documents
    pub pages_processed: u64,
    pub time_per_page: f64,
    pub memory_compliant: bool,
    pub time_compliant: bool,
    pub memory_ceiling_mb: f64,
    pub max_secs_per_page: f64,
    pub documents_finalized: usize,
    pub documents_failed: usize,
    pub documents: Vec<DocumentTiming>,
}

impl PerformanceReport {
    /// Build the report from the batch wall clock, the observed memory peak
    /// and the per-document measurements.
    pub fn new(
        elapsed: Duration,
        peak_memory_mb: f64,
        measurements: &[DocumentMeasurement],
        memory_ceiling_mb: f64,
        max_secs_per_page: f64,
    ) -> Self {
        let elapsed_secs = elapsed.as_secs_f64();
        let finalized = measurements
            .iter()
            .filter(|m| m.state == DocumentState::Finalized);
        let pages_processed: u64 = finalized.clone().map(|m| m.pages as u64).sum();
        let documents_finalized = finalized.count();
        let time_per_page = elapsed_secs / pages_processed.max(1) as f64;

        let worker_total: f64 = measurements.iter().map(|m| m.elapsed.as_secs_f64()).sum();
        let documents = measurements
            .iter()
            .map(|m| {
                let secs = m.elapsed.as_secs_f64();
                let share_secs = if worker_total > 0.0 {
                    elapsed_secs * secs / worker_total
                } else {
                    0.0
                };
                DocumentTiming {
                    document: m.document.clone(),
                    state: m.state,
                    pages: m.pages,
                    elapsed_secs: secs,
                    share_secs,
                }
            })
            .collect();

        Self {
            elapsed_secs,
            peak_memory_mb,
            pages_processed,
            time_per_page,
            memory_compliant: peak_memory_mb <= memory_ceiling_mb,
            time_compliant: time_per_page <= max_secs_per_page,
            memory_ceiling_mb,
            max_secs_per_page,
            documents_finalized,
            documents_failed: measurements.len() - documents_finalized,
            documents,
        }
    }

    /// Whether both ceilings were respected.
    pub fn is_compliant(&self) -> bool {
        self.memory_compliant && self.time_compliant
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "documents: {} finalized, {} failed",
            self.documents_finalized, self.documents_failed
        )?;
        writeln!(f, "elapsed: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "pages processed: {}", self.pages_processed)?;
        writeln!(
            f,
            "time per page: {:.4}s (ceiling {:.3}s, compliant: {})",
            self.time_per_page, self.max_secs_per_page, self.time_compliant
        )?;
        write!(
            f,
            "peak memory: {:.1} MB (ceiling {:.0} MB, compliant: {})",
            self.peak_memory_mb, self.memory_ceiling_mb, self.memory_compliant
        )
    }
}
