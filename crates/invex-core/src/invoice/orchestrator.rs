//! Batch orchestration: one matching pass per document, results in input order.

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::models::config::InvexConfig;
use crate::models::invoice::{ExtractionResult, InvoiceFields, ResultBatch};
use crate::models::overrides::Overrides;

use super::enrichment::Enricher;
use super::matcher::LabelMatcher;

/// A document handed to the orchestrator: a name and its extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub filename: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            text: text.into(),
        }
    }
}

impl<F: Into<String>, T: Into<String>> From<(F, T)> for SourceDocument {
    fn from((filename, text): (F, T)) -> Self {
        Self::new(filename, text)
    }
}

/// Runs the matcher over documents and collects a [`ResultBatch`].
///
/// Per-document problems never abort the batch; they leave fields absent
/// and add warnings to that document's result.
pub struct Orchestrator {
    matcher: LabelMatcher,
    enricher: Option<Box<dyn Enricher>>,
}

impl Orchestrator {
    /// Orchestrator with the default matcher and no enrichment.
    pub fn new() -> Self {
        Self {
            matcher: LabelMatcher::new(),
            enricher: None,
        }
    }

    /// Orchestrator with a matcher compiled from configuration.
    pub fn from_config(config: &InvexConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            matcher: LabelMatcher::from_config(&config.patterns, &config.extraction)?,
            enricher: None,
        })
    }

    /// Install an enricher, called after the heuristic pass.
    pub fn with_enricher(mut self, enricher: impl Enricher + 'static) -> Self {
        self.enricher = Some(Box::new(enricher));
        self
    }

    /// Process documents in order.
    pub fn process<I, D>(&self, documents: I) -> ResultBatch
    where
        I: IntoIterator<Item = D>,
        D: Into<SourceDocument>,
    {
        let start = Instant::now();
        let batch: ResultBatch = documents
            .into_iter()
            .map(|doc| self.process_document(&doc.into()))
            .collect();

        info!(
            "Processed {} documents in {}ms",
            batch.len(),
            start.elapsed().as_millis()
        );
        batch
    }

    /// Process documents, then apply user overrides as a final pass.
    pub fn process_with_overrides<I, D>(&self, documents: I, overrides: &Overrides) -> ResultBatch
    where
        I: IntoIterator<Item = D>,
        D: Into<SourceDocument>,
    {
        self.process(documents).apply_overrides(overrides)
    }

    /// Extract one document.
    pub fn process_document(&self, document: &SourceDocument) -> ExtractionResult {
        let mut result = ExtractionResult::empty(&document.filename);

        if document.text.trim().is_empty() {
            warn!("No text extracted from {}", document.filename);
            result.warnings.push("no text extracted".to_string());
            return result;
        }

        let matches = self.matcher.extract_matches(&document.text);
        if matches.total_from_fallback {
            result
                .warnings
                .push("total_amount inferred from largest amount".to_string());
        }
        result.fields = matches.into_fields(self.matcher.normalizes_dates());

        if let Some(enricher) = &self.enricher {
            if !result.fields.missing().is_empty() {
                self.enrich(enricher.as_ref(), &document.text, &mut result);
            }
        }

        for column in result.fields.missing() {
            result.warnings.push(format!("{} not found", column));
        }

        debug!(
            "Extracted {}: number={:?} date={:?} subtotal={:?} vat={:?} total={:?}",
            result.filename,
            result.fields.invoice_number,
            result.fields.invoice_date,
            result.fields.subtotal,
            result.fields.vat_amount,
            result.fields.total_amount
        );

        result
    }

    fn enrich(&self, enricher: &dyn Enricher, text: &str, result: &mut ExtractionResult) {
        match enricher.enrich(text) {
            Ok(enriched) => {
                let fields: InvoiceFields = enriched.into_fields();
                result.enriched = result.fields.fill_absent(&fields);
                if !result.enriched.is_empty() {
                    debug!(
                        "{} filled {:?} for {}",
                        enricher.name(),
                        result.enriched,
                        result.filename
                    );
                }
            }
            Err(e) => {
                warn!("Enrichment by {} failed for {}: {}", enricher.name(), result.filename, e);
                result.warnings.push(format!("enrichment failed: {}", e));
            }
        }
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}
