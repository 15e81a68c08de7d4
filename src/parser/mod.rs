//! PDF structure parsing module.

mod backend;
mod heading;
mod layout;
mod options;
mod structure;

pub use backend::{LopdfBackend, PageSource, PdfProvider, SourceProvider};
pub use heading::{FontClusterStrategy, FontStatistics, HeadingStrategy, SizeCluster, SizeLevels};
pub use layout::{detect_columns, spans_to_runs, Column, TextSpan};
pub use options::{ErrorMode, ParseOptions};
pub use structure::{SectionBuilder, StructuralParser};
