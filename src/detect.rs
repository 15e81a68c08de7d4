//! PDF header sniffing.
//!
//! Sources are checked before lopdf loads them so that a stray non-PDF
//! file in an input directory fails fast with [`Error::UnknownFormat`]
//! instead of a parser error deep inside the container reader.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const PDF_MAGIC: &[u8] = b"%PDF-";
const HEADER_LEN: usize = PDF_MAGIC.len() + 3;

/// Read the header of `path` and return the declared PDF version.
pub fn pdf_version_from_path<P: AsRef<Path>>(path: P) -> Result<String> {
    let mut header = [0u8; HEADER_LEN];
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < HEADER_LEN {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            return Err(Error::UnknownFormat);
        }
        filled += n;
    }
    pdf_version_from_bytes(&header)
}

/// Return the declared PDF version of `data` (e.g. `"1.7"`).
pub fn pdf_version_from_bytes(data: &[u8]) -> Result<String> {
    if data.len() < HEADER_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version = String::from_utf8_lossy(&data[PDF_MAGIC.len()..HEADER_LEN]).to_string();
    let mut parts = version.split('.');
    match (parts.next(), parts.next()) {
        (Some(major), Some(minor))
            if matches!(major, "1" | "2") && minor.len() == 1 && minor.as_bytes()[0].is_ascii_digit() =>
        {
            Ok(version)
        }
        _ => Err(Error::UnsupportedVersion(version)),
    }
}

/// Quick check whether `data` starts with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    pdf_version_from_bytes(data).is_ok()
}
