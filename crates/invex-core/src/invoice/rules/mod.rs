//! Rule-based field extractors for invoice text.

pub mod amounts;
pub mod dates;
pub mod labels;
pub mod patterns;
pub mod scanner;

pub use amounts::{canonical_amount, normalize_amount, to_decimal};
pub use dates::{normalize_date, DateExtractor};
pub use labels::{InvoiceNumberExtractor, KeywordTable, MoneyField};
pub use scanner::{AmountScanner, RawAmountToken};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.extract(text).into_iter().collect()
    }
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Zero-based index of the source line among the document's trimmed,
    /// non-empty lines.
    pub line: Option<usize>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            line: None,
            source: source.into(),
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}
