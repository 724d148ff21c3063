//! Error types for the invex-core library.

use thiserror::Error;

/// Main error type for the invex library.
#[derive(Error, Debug)]
pub enum InvexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Export error.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Enrichment error.
    #[error("enrichment error: {0}")]
    Enrichment(#[from] EnrichmentError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to PDF text extraction.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors in pattern tables, overrides and configuration files.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A pattern table entry does not compile.
    #[error("invalid pattern in {name}: {source}")]
    InvalidPattern {
        name: &'static str,
        #[source]
        source: regex::Error,
    },

    /// A pattern table is empty where at least one entry is required.
    #[error("pattern table {0} is empty")]
    EmptyTable(&'static str),

    /// Unknown output column name.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// Malformed cell edit.
    #[error("invalid override {edit}: {reason}")]
    InvalidOverride { edit: String, reason: String },

    /// Configuration file could not be decoded.
    #[error("failed to decode configuration: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors raised by table sinks.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV serialization failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Workbook creation failed.
    #[error("xlsx error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Writing to the sink failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from an enrichment collaborator.
///
/// These never cross the orchestrator boundary; they are downgraded to
/// per-document warnings.
#[derive(Error, Debug)]
pub enum EnrichmentError {
    /// The transport failed (connection, timeout, HTTP status).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The collaborator answered with something that is not a field record.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result type for the invex library.
pub type Result<T> = std::result::Result<T, InvexError>;
