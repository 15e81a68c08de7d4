//! Document model types.
//!
//! `Document`/`Page`/`TextRun` are what a page source yields; `Section`
//! and `ParsedDocument` are what the structural parser produces from them.

mod document;
mod page;
mod section;

pub use document::{document_id, Document, Outline, OutlineEntry, ParsedDocument};
pub use page::{Page, TextRun};
pub use section::Section;
