//! Batch processing command: many invoice files into one table.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use invex_core::export::{CsvSink, JsonSink, ResultTable, TableSink, XlsxSink};
use invex_core::models::config::ExportConfig;
use invex_core::{Overrides, ResultBatch};

use super::input::{build_orchestrator, is_supported, load_config, read_document};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern for input files (.pdf, .txt)
    #[arg(required = true)]
    input: String,

    /// Output file (default: stdout; required for xlsx)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format for the table
    #[arg(short, long, value_enum, default_value = "csv")]
    format: TableFormat,

    /// Replace a cell before export, as ROW:COLUMN=VALUE (row is zero-based)
    #[arg(long = "override", value_name = "ROW:COLUMN=VALUE")]
    overrides: Vec<String>,

    /// JSON file of cell overrides: [{"row", "column", "value"}]
    #[arg(long)]
    overrides_file: Option<PathBuf>,

    /// Fill missing fields through the enrichment endpoint
    #[arg(long)]
    enrich: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum TableFormat {
    /// CSV table
    Csv,
    /// JSON array of rows
    Json,
    /// Excel workbook
    Xlsx,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let overrides = collect_overrides(&args)?;

    if matches!(args.format, TableFormat::Xlsx) && args.output.is_none() {
        anyhow::bail!("xlsx output needs a file; pass --output");
    }

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
            )?
            .progress_chars("=>-"),
    );

    let export = config.export.clone();
    let enrich = args.enrich;
    let progress = pb.clone();
    let batch = tokio::task::spawn_blocking(move || -> anyhow::Result<ResultBatch> {
        let orchestrator = build_orchestrator(&config, enrich)?;
        let batch: ResultBatch = files
            .iter()
            .map(|path| {
                debug!("Processing {}", path.display());
                let result = read_document(path, &config.pdf).extract(&orchestrator);
                progress.inc(1);
                result
            })
            .collect();
        Ok(batch)
    })
    .await??;

    pb.finish_and_clear();
    info!("Extracted {} documents", batch.len());

    let batch = batch.apply_overrides(&overrides);
    write_table(&batch, &args, &export)?;

    print_summary(&batch, start);

    Ok(())
}

fn collect_overrides(args: &BatchArgs) -> anyhow::Result<Overrides> {
    let mut overrides = match &args.overrides_file {
        Some(path) => Overrides::from_file(path)?,
        None => Overrides::new(),
    };
    for edit in &args.overrides {
        let entry = Overrides::parse_edit(edit)?;
        overrides.insert(entry.row, entry.column, entry.value);
    }
    Ok(overrides)
}

fn write_table(
    batch: &ResultBatch,
    args: &BatchArgs,
    export: &ExportConfig,
) -> anyhow::Result<()> {
    let table = ResultTable::from(batch);
    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };

    match args.format {
        TableFormat::Csv => CsvSink::new(writer, export.delimiter_byte()).write_table(&table)?,
        TableFormat::Json => JsonSink::new(writer, true).write_table(&table)?,
        TableFormat::Xlsx => XlsxSink::new(writer, &export.sheet_name).write_table(&table)?,
    }

    if let Some(path) = &args.output {
        eprintln!(
            "{} Table written to {}",
            style("✓").green(),
            path.display()
        );
    }
    Ok(())
}

fn print_summary(batch: &ResultBatch, start: Instant) {
    let complete = batch.iter().filter(|r| r.fields.missing().is_empty()).count();
    let with_warnings: Vec<_> = batch.iter().filter(|r| !r.warnings.is_empty()).collect();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        batch.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} complete, {} with warnings",
        style(complete).green(),
        style(with_warnings.len()).yellow()
    );

    if !with_warnings.is_empty() {
        eprintln!();
        eprintln!("{}", style("Warnings:").yellow());
        for result in with_warnings {
            eprintln!("  - {}: {}", result.filename, result.warnings.join("; "));
        }
    }
}
