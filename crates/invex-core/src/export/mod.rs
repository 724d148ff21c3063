//! Tabular export of a result batch.

use std::io::Write;

use rust_xlsxwriter::{Format, Workbook};
use serde_json::{Map, Value};

use crate::error::ExportError;
use crate::models::invoice::{Column, ExtractionResult, ResultBatch};

/// The batch as a table of strings: one header row, one row per document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl From<&ResultBatch> for ResultTable {
    fn from(batch: &ResultBatch) -> Self {
        Self {
            headers: Column::ALL.iter().map(|c| c.as_str()).collect(),
            rows: batch.iter().map(|r| r.row()).collect(),
        }
    }
}

/// Serialization sink for a result table.
pub trait TableSink {
    fn write_table(&mut self, table: &ResultTable) -> Result<(), ExportError>;
}

/// CSV sink.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W, delimiter: u8) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(inner);
        Self { writer }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, ExportError> {
        self.writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))
    }
}

impl<W: Write> TableSink for CsvSink<W> {
    fn write_table(&mut self, table: &ResultTable) -> Result<(), ExportError> {
        self.writer.write_record(&table.headers)?;
        for row in &table.rows {
            self.writer.write_record(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON sink: an array of objects keyed by column name.
pub struct JsonSink<W: Write> {
    inner: W,
    pretty: bool,
}

impl<W: Write> JsonSink<W> {
    pub fn new(inner: W, pretty: bool) -> Self {
        Self { inner, pretty }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> TableSink for JsonSink<W> {
    fn write_table(&mut self, table: &ResultTable) -> Result<(), ExportError> {
        let rows: Vec<Value> = table
            .rows
            .iter()
            .map(|row| Value::Object(row_object(&table.headers, row)))
            .collect();

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.inner, &rows)?;
        } else {
            serde_json::to_writer(&mut self.inner, &rows)?;
        }
        self.inner.flush()?;
        Ok(())
    }
}

/// Excel workbook sink: one worksheet, bold header row, string cells.
pub struct XlsxSink<W: Write> {
    inner: W,
    sheet_name: String,
}

impl<W: Write> XlsxSink<W> {
    pub fn new(inner: W, sheet_name: impl Into<String>) -> Self {
        Self {
            inner,
            sheet_name: sheet_name.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> TableSink for XlsxSink<W> {
    fn write_table(&mut self, table: &ResultTable) -> Result<(), ExportError> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;
        for (col, name) in (0u16..).zip(&table.headers) {
            worksheet.write_string_with_format(0, col, *name, &header)?;
        }
        for (row, cells) in (1u32..).zip(&table.rows) {
            // Absent values stay blank cells.
            for (col, value) in (0u16..).zip(cells) {
                if !value.is_empty() {
                    worksheet.write_string(row, col, value)?;
                }
            }
        }

        let bytes = workbook.save_to_buffer()?;
        self.inner.write_all(&bytes)?;
        self.inner.flush()?;
        Ok(())
    }
}

fn row_object(headers: &[&str], row: &[String]) -> Map<String, Value> {
    headers
        .iter()
        .zip(row)
        .map(|(h, v)| (h.to_string(), Value::String(v.clone())))
        .collect()
}

/// One result as a JSON object: the six table columns (absent fields as
/// empty strings), then `enriched` and `warnings`.
pub fn result_object(result: &ExtractionResult) -> Value {
    let headers: Vec<&str> = Column::ALL.iter().map(|c| c.as_str()).collect();
    let mut object = row_object(&headers, &result.row());

    let enriched = result
        .enriched
        .iter()
        .map(|c| Value::String(c.to_string()))
        .collect();
    let warnings = result.warnings.iter().cloned().map(Value::String).collect();
    object.insert("enriched".to_string(), Value::Array(enriched));
    object.insert("warnings".to_string(), Value::Array(warnings));

    Value::Object(object)
}

/// Render a batch as CSV text.
pub fn to_csv_string(batch: &ResultBatch, delimiter: u8) -> Result<String, ExportError> {
    let mut sink = CsvSink::new(Vec::new(), delimiter);
    sink.write_table(&ResultTable::from(batch))?;
    let bytes = sink.into_inner()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
