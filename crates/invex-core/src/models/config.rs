//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;
use crate::invoice::rules::patterns;

/// Main configuration for the invex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvexConfig {
    /// Declarative pattern tables used by the label matcher.
    pub patterns: PatternConfig,

    /// Field extraction behaviour.
    pub extraction: ExtractionConfig,

    /// PDF text extraction configuration.
    pub pdf: PdfConfig,

    /// Optional enrichment pass.
    pub enrichment: EnrichmentConfig,

    /// Table export configuration.
    pub export: ExportConfig,
}

/// Pattern tables for the label-value matcher.
///
/// Entries ending in `_labels` or `_shapes` are regex fragments, entries
/// ending in `_keywords` are literal, case-insensitive keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Currency symbols that may prefix an amount.
    pub currency_symbols: Vec<String>,

    /// Labels preceding an invoice number.
    pub invoice_number_labels: Vec<String>,

    /// Weak label used when none of the primary labels match.
    pub invoice_number_fallback_label: String,

    /// Number of non-empty lines searched with the fallback label.
    pub invoice_number_fallback_lines: usize,

    /// Labels preceding an invoice date.
    pub date_labels: Vec<String>,

    /// Accepted date shapes.
    pub date_shapes: Vec<String>,

    /// Number of non-empty lines searched for a date.
    pub date_lines: usize,

    /// Keywords marking a total line.
    pub total_keywords: Vec<String>,

    /// Keywords marking a VAT/tax line.
    pub vat_keywords: Vec<String>,

    /// Keywords marking a subtotal line.
    pub subtotal_keywords: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            currency_symbols: owned(patterns::DEFAULT_CURRENCY_SYMBOLS),
            invoice_number_labels: owned(patterns::DEFAULT_INVOICE_NUMBER_LABELS),
            invoice_number_fallback_label: patterns::DEFAULT_INVOICE_NUMBER_FALLBACK_LABEL
                .to_string(),
            invoice_number_fallback_lines: 30,
            date_labels: owned(patterns::DEFAULT_DATE_LABELS),
            date_shapes: owned(patterns::DEFAULT_DATE_SHAPES),
            date_lines: 40,
            total_keywords: owned(patterns::DEFAULT_TOTAL_KEYWORDS),
            vat_keywords: owned(patterns::DEFAULT_VAT_KEYWORDS),
            subtotal_keywords: owned(patterns::DEFAULT_SUBTOTAL_KEYWORDS),
        }
    }
}

/// Field extraction behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Use the largest amount in the document when no total is labeled.
    pub total_fallback_to_largest: bool,

    /// Rewrite recognised dates as `YYYY-MM-DD`.
    pub normalize_dates: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            total_fallback_to_largest: true,
            normalize_dates: false,
        }
    }
}

/// PDF text extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Below this many characters the PDF is reported as a probable scan.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_text_length: 100,
        }
    }
}

/// Enrichment endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Run the enrichment pass for fields the matcher left absent.
    pub enabled: bool,

    /// Text-generation endpoint URL.
    pub endpoint: String,

    /// Generation budget sent with each request.
    pub max_new_tokens: u32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Environment variable holding an optional bearer token.
    pub api_token_env: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: concat!(
                "https://api-inference.huggingface.co/models/",
                "mistralai/Mistral-7B-Instruct-v0.2"
            )
            .to_string(),
            max_new_tokens: 100,
            timeout_secs: 60,
            api_token_env: "INVEX_API_TOKEN".to_string(),
        }
    }
}

/// Table export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Worksheet name for xlsx output.
    pub sheet_name: String,

    /// Field delimiter for CSV output.
    pub delimiter: char,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            sheet_name: "invoices".to_string(),
            delimiter: ',',
        }
    }
}

impl ExportConfig {
    /// Delimiter as a single byte, falling back to a comma for non-ASCII input.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }
}

impl InvexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Decode configuration from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
