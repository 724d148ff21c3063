//! Process command - extract fields from a single invoice file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use invex_core::export::{result_object, to_csv_string};
use invex_core::{Column, ExtractionResult, ResultBatch};

use super::input::{build_orchestrator, is_supported, load_config, read_document};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Fill missing fields through the enrichment endpoint
    #[arg(long)]
    enrich: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    if !is_supported(&args.input) {
        anyhow::bail!("Unsupported file format: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let input = args.input.clone();
    let enrich = args.enrich;
    let pdf_config = config.pdf.clone();
    let delimiter = config.export.delimiter_byte();
    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<ExtractionResult> {
        let orchestrator = build_orchestrator(&config, enrich)?;
        Ok(read_document(&input, &pdf_config).extract(&orchestrator))
    })
    .await??;

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&result_object(&result))?,
        OutputFormat::Csv => to_csv_string(&ResultBatch::new(vec![result.clone()]), delimiter)?,
        OutputFormat::Text => format_result_text(&result),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output.trim_end());
    }

    for warning in &result.warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn format_result_text(result: &ExtractionResult) -> String {
    let mut output = String::new();

    for column in Column::ALL {
        let value = result.cell(column);
        let shown = if value.is_empty() { "-" } else { value };
        let marker = if result.enriched.contains(&column) {
            " (enriched)"
        } else {
            ""
        };
        output.push_str(&format!("{:<15} {}{}\n", format!("{}:", column), shown, marker));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_result_text() {
        let mut result = ExtractionResult::empty("a.txt");
        result.fields.total_amount = Some("10.00".to_string());
        result.enriched.push(Column::TotalAmount);

        let text = format_result_text(&result);
        assert!(text.contains("filename:       a.txt"));
        assert!(text.contains("invoice_number: -"));
        assert!(text.contains("total_amount:   10.00 (enriched)"));
    }
}
