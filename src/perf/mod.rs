//! Performance mode: outline extraction under time and memory accounting.

mod controller;
mod memory;
mod report;
mod state;

pub use controller::{BatchResult, ControllerConfig, DocumentOutcome, ExecutionController};
pub use memory::{MemorySampler, ProcessMemory};
pub use report::{DocumentMeasurement, DocumentTiming, PerformanceReport};
pub use state::{DocumentRun, DocumentState};
