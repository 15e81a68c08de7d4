//! Page sources.
//!
//! The structural parser never touches the PDF container directly; it pulls
//! decoded pages one at a time from a [`PageSource`]. [`LopdfBackend`] is
//! the concrete source for real PDFs; an in-memory [`Document`] is a source
//! too.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Document as LopdfDocument, Object, ObjectId};

use crate::detect::pdf_version_from_path;
use crate::error::{Error, Result};
use crate::model::{document_id, Document, Page};

use super::layout;

/// A document whose pages can be decoded individually, in any order,
/// as many times as needed.
pub trait PageSource {
    /// Stable document identifier.
    fn id(&self) -> &str;

    /// Number of pages.
    fn page_count(&self) -> u32;

    /// Decode page `number` (1-indexed) into text runs.
    fn read_page(&self, number: u32) -> Result<Page>;

    /// Title from document metadata, if any.
    fn title(&self) -> Option<String> {
        None
    }
}

/// Opens page sources for document paths.
pub trait SourceProvider: Sync {
    /// The source type produced.
    type Source: PageSource;

    /// Open the document at `path`.
    fn open(&self, path: &Path) -> Result<Self::Source>;
}

/// Simple text decoding fallback when no font encoding is available.
pub(crate) fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE_u8, 0xFF][..]) {
        let utf16: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Latin-1
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

// ---------------------------------------------------------------------------
// LopdfBackend
// ---------------------------------------------------------------------------

/// [`PageSource`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    id: String,
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        pdf_version_from_path(path)?;
        let doc = LopdfDocument::load(path)?;
        Self::from_document(document_id(path), doc)
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(id: impl Into<String>, data: &[u8]) -> Result<Self> {
        crate::detect::pdf_version_from_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(id.into(), doc)
    }

    fn from_document(id: String, doc: LopdfDocument) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }
        let pages = doc.get_pages();
        log::debug!("{}: PDF {} with {} pages", id, doc.version, pages.len());
        Ok(Self { id, doc, pages })
    }

    /// PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }
}

impl PageSource for LopdfBackend {
    fn id(&self) -> &str {
        &self.id
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn read_page(&self, number: u32) -> Result<Page> {
        let page_id = *self
            .pages
            .get(&number)
            .ok_or(Error::PageOutOfRange(number, self.page_count()))?;
        let spans = layout::extract_page_spans(&self.doc, page_id).map_err(|e| match e {
            Error::PdfParse(reason) => Error::PageDecode {
                page: number,
                reason,
            },
            other => other,
        })?;
        Ok(Page::with_runs(number, layout::spans_to_runs(spans)))
    }

    fn title(&self) -> Option<String> {
        let info = self.doc.trailer.get(b"Info").ok()?;
        let dict = match info {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok()?,
            Object::Dictionary(d) => d,
            _ => return None,
        };
        let title = match dict.get(b"Title").ok()? {
            Object::String(bytes, _) => decode_text_simple(bytes),
            _ => return None,
        };
        let title = title.trim();
        (!title.is_empty()).then(|| title.to_string())
    }
}

/// Opens PDFs from disk through [`LopdfBackend`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfProvider;

impl SourceProvider for PdfProvider {
    type Source = LopdfBackend;

    fn open(&self, path: &Path) -> Result<LopdfBackend> {
        LopdfBackend::load_file(path)
    }
}

/// Already-decoded documents serve their pages from memory.
impl PageSource for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn page_count(&self) -> u32 {
        Document::page_count(self)
    }

    fn read_page(&self, number: u32) -> Result<Page> {
        self.get_page(number)
            .cloned()
            .ok_or(Error::PageOutOfRange(number, Document::page_count(self)))
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TextRun;

    #[test]
    fn test_decode_text_simple_utf8() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
    }

    #[test]
    fn test_decode_text_simple_latin1() {
        let bytes = vec![0x48, 0x65, 0x6C, 0x6C, 0xE9];
        assert_eq!(decode_text_simple(&bytes), "Hellé");
    }

    #[test]
    fn test_decode_text_simple_utf16be() {
        let bytes = vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_text_simple(&bytes), "Hi");
    }

    #[test]
    fn test_document_as_page_source() {
        let mut doc = Document::new("notes.pdf");
        doc.add_page(Page::with_runs(0, vec![TextRun::new("Hello", 12.0, 700.0)]));
        let source: &dyn PageSource = &doc;

        assert_eq!(source.id(), "notes.pdf");
        assert_eq!(source.page_count(), 1);
        assert_eq!(source.read_page(1).unwrap().runs[0].text, "Hello");
        assert!(matches!(
            source.read_page(2),
            Err(Error::PageOutOfRange(2, 1))
        ));
    }

    #[test]
    fn test_load_bytes_rejects_garbage() {
        assert!(matches!(
            LopdfBackend::load_bytes("x.pdf", b"not a pdf"),
            Err(Error::UnknownFormat)
        ));
    }
}
