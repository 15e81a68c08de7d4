//! Error types for docsift.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docsift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while parsing, ranking or running a batch.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The job specification is missing a field or is malformed.
    #[error("Invalid specification: {0}")]
    Specification(String),

    /// A referenced document does not exist or cannot be read.
    #[error("Cannot access document {}: {reason}", path.display())]
    DocumentAccess {
        /// The path as given in the job.
        path: PathBuf,
        /// Why the document was rejected.
        reason: String,
    },

    /// No document survived validation and parsing.
    #[error("No valid PDF documents to process")]
    NoValidDocuments,

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A single page could not be decoded.
    #[error("Page {page} could not be decoded: {reason}")]
    PageDecode {
        /// 1-based page number.
        page: u32,
        /// Decoder message.
        reason: String,
    },

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// The document decoded but carries no extractable text.
    #[error("Document has no extractable text")]
    EmptyDocument,

    /// A document run attempted an illegal state change.
    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition {
        /// State the run was in.
        from: &'static str,
        /// State that was requested.
        to: &'static str,
    },

    /// Error serializing output.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error only disqualifies a single document.
    ///
    /// Document-level errors are recorded and the batch continues;
    /// everything else aborts the run.
    pub fn is_document_level(&self) -> bool {
        matches!(
            self,
            Error::DocumentAccess { .. }
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::PdfParse(_)
                | Error::Encrypted
                | Error::PageDecode { .. }
                | Error::PageOutOfRange(..)
                | Error::EmptyDocument
                | Error::Io(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}
