//! Shared input handling: configuration, document text and orchestrator setup.

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use invex_core::models::config::{InvexConfig, PdfConfig};
use invex_core::pdf::{looks_scanned, PdfTextSource, PlainTextSource, TextSource};
use invex_core::{ExtractionResult, Orchestrator, SourceDocument};

use super::config::default_config_path;
use super::enrich::HttpEnricher;

/// Extensions accepted as input documents.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "txt"];

/// A document read from disk, with the problems found while reading it.
pub struct LoadedDocument {
    pub document: SourceDocument,
    pub warnings: Vec<String>,
}

impl LoadedDocument {
    /// Run the orchestrator and attach the read warnings to the result.
    pub fn extract(self, orchestrator: &Orchestrator) -> ExtractionResult {
        let mut result = orchestrator.process_document(&self.document);
        let mut warnings = self.warnings;
        warnings.append(&mut result.warnings);
        result.warnings = warnings;
        result
    }
}

/// Load the configuration: explicit path, else the default file if present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<InvexConfig> {
    if let Some(path) = config_path {
        return InvexConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path, e));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config at {}", default_path.display());
        return InvexConfig::from_file(&default_path).map_err(|e| {
            anyhow::anyhow!("Failed to read config {}: {}", default_path.display(), e)
        });
    }

    Ok(InvexConfig::default())
}

/// Build the orchestrator, with the HTTP enricher when enrichment is on.
///
/// Must be called off the async runtime: the blocking HTTP client owns its own runtime.
pub fn build_orchestrator(config: &InvexConfig, enrich: bool) -> anyhow::Result<Orchestrator> {
    let orchestrator = Orchestrator::from_config(config)?;
    if enrich || config.enrichment.enabled {
        let enricher = HttpEnricher::from_config(&config.enrichment)?;
        debug!("Enrichment enabled via {}", config.enrichment.endpoint);
        return Ok(orchestrator.with_enricher(enricher));
    }
    Ok(orchestrator)
}

pub fn is_supported(path: &Path) -> bool {
    extension(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Read a document's text. Failures become warnings and empty text.
pub fn read_document(path: &Path, pdf: &PdfConfig) -> LoadedDocument {
    let filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let mut warnings = Vec::new();

    let is_pdf = extension(path).as_deref() == Some("pdf");
    let text = match fs::read(path) {
        Ok(data) => {
            let source: &dyn TextSource = if is_pdf { &PdfTextSource } else { &PlainTextSource };
            match source.text_from_bytes(&data) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to extract text from {}: {}", path.display(), e);
                    warnings.push(format!("text extraction failed: {}", e));
                    String::new()
                }
            }
        }
        Err(e) => {
            warn!("Failed to read {}: {}", path.display(), e);
            warnings.push(format!("read failed: {}", e));
            String::new()
        }
    };

    if is_pdf && !text.trim().is_empty() && looks_scanned(&text, pdf.min_text_length) {
        warn!("{} has little embedded text; it may be a scan", filename);
        warnings.push("little embedded text, document may be scanned".to_string());
    }

    LoadedDocument {
        document: SourceDocument::new(filename, text),
        warnings,
    }
}
