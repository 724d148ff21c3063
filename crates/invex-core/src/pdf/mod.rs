//! PDF text extraction.
//!
//! Only embedded text is read; scanned pages come back empty and the
//! document is then reported as having no extractable text.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Extract text from the entire PDF.
    fn extract_text(&self) -> Result<String>;
}

/// Source of raw document text.
pub trait TextSource {
    /// Raw text for a document's bytes.
    fn text_from_bytes(&self, data: &[u8]) -> Result<String>;
}

/// Reads embedded PDF text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl TextSource for PdfTextSource {
    fn text_from_bytes(&self, data: &[u8]) -> Result<String> {
        let mut extractor = PdfExtractor::new();
        extractor.load(data)?;
        extractor.extract_text()
    }
}

/// Plain UTF-8 text files; invalid sequences are replaced.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl TextSource for PlainTextSource {
    fn text_from_bytes(&self, data: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(data).into_owned())
    }
}

/// True when extracted text is too short to come from a digital PDF.
pub fn looks_scanned(text: &str, min_text_length: usize) -> bool {
    text.trim().chars().count() < min_text_length
}
