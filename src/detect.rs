//! Input format detection.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Container format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Office Open XML word-processing document (ZIP container)
    Docx,
    /// Legacy binary Word document (OLE compound file)
    LegacyDoc,
    /// UTF-8 plain text or markdown export
    PlainText,
}

impl std::fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerFormat::Docx => write!(f, "DOCX"),
            ContainerFormat::LegacyDoc => write!(f, "DOC (legacy)"),
            ContainerFormat::PlainText => write!(f, "plain text"),
        }
    }
}

/// ZIP local file header magic: PK\x03\x04
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// OLE compound file magic
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Bytes inspected when deciding whether input is text.
const TEXT_SNIFF_LEN: usize = 4096;

/// Detect the container format from a file path.
///
/// # Example
/// ```no_run
/// use unquiz::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("bank.docx").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<ContainerFormat> {
    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(TEXT_SNIFF_LEN);
    file.by_ref()
        .take(TEXT_SNIFF_LEN as u64)
        .read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the container format from the leading bytes of a file.
///
/// # Returns
/// * `Ok(ContainerFormat)` for DOCX, legacy DOC or UTF-8 text
/// * `Err(Error::UnknownFormat)` for anything else
pub fn detect_format_from_bytes(data: &[u8]) -> Result<ContainerFormat> {
    if data.starts_with(ZIP_MAGIC) {
        return Ok(ContainerFormat::Docx);
    }
    if data.starts_with(OLE_MAGIC) {
        return Ok(ContainerFormat::LegacyDoc);
    }
    if looks_like_text(data) {
        return Ok(ContainerFormat::PlainText);
    }
    Err(Error::UnknownFormat)
}

/// UTF-8 without NUL bytes. A multi-byte sequence cut at the sniff boundary is tolerated.
fn looks_like_text(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }
    let sample = &data[..data.len().min(TEXT_SNIFF_LEN)];
    if sample.contains(&0) {
        return false;
    }
    match std::str::from_utf8(sample) {
        Ok(_) => true,
        Err(e) => e.error_len().is_none() && sample.len() == TEXT_SNIFF_LEN,
    }
}

/// Check if bytes start like a DOCX container.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}
