//! Core library for invoice field extraction.
//!
//! This crate provides:
//! - Amount normalization and scanning with exact decimals
//! - Label-value matching for invoice number, date, subtotal, VAT and total
//! - Batch orchestration with optional enrichment and user overrides
//! - PDF text extraction and tabular export

pub mod error;
pub mod export;
pub mod invoice;
pub mod models;
pub mod pdf;

pub use error::{InvexError, Result};
pub use export::{CsvSink, JsonSink, ResultTable, TableSink, XlsxSink};
pub use invoice::{
    EnrichedFields, Enricher, FieldMatches, LabelMatcher, Orchestrator, SourceDocument,
};
pub use models::invoice::{Column, ExtractionResult, InvoiceFields, ResultBatch};
pub use models::overrides::{OverrideEntry, Overrides};
pub use models::InvexConfig;
pub use pdf::{PdfExtractor, PdfProcessor, PdfTextSource, PlainTextSource, TextSource};
