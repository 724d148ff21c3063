//! Extraction records and the batch they are collected into.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use super::overrides::Overrides;

/// A column of the output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Filename,
    InvoiceNumber,
    InvoiceDate,
    Subtotal,
    VatAmount,
    TotalAmount,
}

impl Column {
    /// All columns in export order.
    pub const ALL: [Column; 6] = [
        Column::Filename,
        Column::InvoiceNumber,
        Column::InvoiceDate,
        Column::Subtotal,
        Column::VatAmount,
        Column::TotalAmount,
    ];

    /// Column name as written in the table header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Filename => "filename",
            Column::InvoiceNumber => "invoice_number",
            Column::InvoiceDate => "invoice_date",
            Column::Subtotal => "subtotal",
            Column::VatAmount => "vat_amount",
            Column::TotalAmount => "total_amount",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Column {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Column::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| ConfigError::UnknownColumn(s.to_string()))
    }
}

/// The five semantic invoice fields, in canonical string form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,

    /// Canonical decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<String>,

    /// Canonical decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vat_amount: Option<String>,

    /// Canonical decimal string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<String>,
}

impl InvoiceFields {
    /// Columns backed by an [`InvoiceFields`] value.
    pub const COLUMNS: [Column; 5] = [
        Column::InvoiceNumber,
        Column::InvoiceDate,
        Column::Subtotal,
        Column::VatAmount,
        Column::TotalAmount,
    ];

    /// Get a field by column. `Filename` has no field and yields `None`.
    pub fn get(&self, column: Column) -> Option<&str> {
        match column {
            Column::Filename => None,
            Column::InvoiceNumber => self.invoice_number.as_deref(),
            Column::InvoiceDate => self.invoice_date.as_deref(),
            Column::Subtotal => self.subtotal.as_deref(),
            Column::VatAmount => self.vat_amount.as_deref(),
            Column::TotalAmount => self.total_amount.as_deref(),
        }
    }

    fn slot(&mut self, column: Column) -> Option<&mut Option<String>> {
        match column {
            Column::Filename => None,
            Column::InvoiceNumber => Some(&mut self.invoice_number),
            Column::InvoiceDate => Some(&mut self.invoice_date),
            Column::Subtotal => Some(&mut self.subtotal),
            Column::VatAmount => Some(&mut self.vat_amount),
            Column::TotalAmount => Some(&mut self.total_amount),
        }
    }

    /// Replace a field value. Empty values clear the field.
    pub fn set(&mut self, column: Column, value: Option<String>) {
        if let Some(slot) = self.slot(column) {
            *slot = value.filter(|v| !v.is_empty());
        }
    }

    /// Fill absent fields from `other`, never replacing a present value.
    ///
    /// Returns the columns that were filled.
    pub fn fill_absent(&mut self, other: &InvoiceFields) -> Vec<Column> {
        let mut filled = Vec::new();
        for column in Self::COLUMNS {
            let Some(value) = other.get(column) else {
                continue;
            };
            if let Some(slot) = self.slot(column) {
                if slot.is_none() {
                    *slot = Some(value.to_string());
                    filled.push(column);
                }
            }
        }
        filled
    }

    /// Columns with no value.
    pub fn missing(&self) -> Vec<Column> {
        Self::COLUMNS
            .into_iter()
            .filter(|c| self.get(*c).is_none())
            .collect()
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.missing().len() == Self::COLUMNS.len()
    }
}

/// Extraction outcome for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Source document name.
    pub filename: String,

    /// Extracted fields.
    #[serde(flatten)]
    pub fields: InvoiceFields,

    /// Columns supplied by the enrichment pass rather than the matcher.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enriched: Vec<Column>,

    /// Per-document extraction warnings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ExtractionResult {
    /// A result with every field absent.
    pub fn empty(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            fields: InvoiceFields::default(),
            enriched: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Cell value for a column; absent fields become the empty string.
    pub fn cell(&self, column: Column) -> &str {
        match column {
            Column::Filename => &self.filename,
            other => self.fields.get(other).unwrap_or(""),
        }
    }

    /// Row of cells in [`Column::ALL`] order.
    pub fn row(&self) -> Vec<String> {
        Column::ALL.iter().map(|c| self.cell(*c).to_string()).collect()
    }

    fn apply_override(&mut self, column: Column, value: &str) {
        match column {
            Column::Filename => self.filename = value.to_string(),
            other => self.fields.set(other, Some(value.to_string())),
        }
    }
}

/// Ordered results of one extraction run, one per input document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultBatch {
    results: Vec<ExtractionResult>,
}

impl ResultBatch {
    /// Wrap results that are already in input order.
    pub fn new(results: Vec<ExtractionResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ExtractionResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExtractionResult> {
        self.results.iter()
    }

    /// Apply user edits as a final pass. Values replace cells verbatim.
    pub fn apply_overrides(mut self, overrides: &Overrides) -> Self {
        for ((row, column), value) in overrides.iter() {
            match self.results.get_mut(*row) {
                Some(result) => result.apply_override(*column, value),
                None => warn!(
                    "Ignoring override for row {} ({}): batch has {} rows",
                    row,
                    column,
                    self.results.len()
                ),
            }
        }
        self
    }
}

impl IntoIterator for ResultBatch {
    type Item = ExtractionResult;
    type IntoIter = std::vec::IntoIter<ExtractionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultBatch {
    type Item = &'a ExtractionResult;
    type IntoIter = std::slice::Iter<'a, ExtractionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl FromIterator<ExtractionResult> for ResultBatch {
    fn from_iter<I: IntoIterator<Item = ExtractionResult>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
