//! User edits to individual result cells.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use super::invoice::Column;

/// One edited cell, as stored in an overrides file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideEntry {
    /// Zero-based row index in the batch.
    pub row: usize,
    /// Edited column.
    pub column: Column,
    /// Replacement value, applied verbatim.
    pub value: String,
}

/// Cell overrides keyed by (row index, column).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    cells: BTreeMap<(usize, Column), String>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an edit. A later edit of the same cell wins.
    pub fn insert(&mut self, row: usize, column: Column, value: impl Into<String>) {
        self.cells.insert((row, column), value.into());
    }

    pub fn get(&self, row: usize, column: Column) -> Option<&str> {
        self.cells.get(&(row, column)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(usize, Column), &String)> {
        self.cells.iter()
    }

    /// Parse a `ROW:COLUMN=VALUE` edit, e.g. `2:total_amount=1250.00`.
    ///
    /// Everything after the first `=` is the value, so values may contain `=`.
    pub fn parse_edit(edit: &str) -> Result<OverrideEntry, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidOverride {
            edit: edit.to_string(),
            reason: reason.to_string(),
        };

        let (cell, value) = edit.split_once('=').ok_or_else(|| invalid("missing '='"))?;
        let (row, column) = cell
            .split_once(':')
            .ok_or_else(|| invalid("expected ROW:COLUMN before '='"))?;
        let row: usize = row
            .trim()
            .parse()
            .map_err(|_| invalid("row is not a non-negative integer"))?;
        let column: Column = column.parse()?;

        Ok(OverrideEntry {
            row,
            column,
            value: value.to_string(),
        })
    }

    /// Decode a JSON array of [`OverrideEntry`].
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let entries: Vec<OverrideEntry> = serde_json::from_str(content)?;
        Ok(entries.into_iter().collect())
    }

    /// Load overrides from a JSON file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }
}

impl FromIterator<OverrideEntry> for Overrides {
    fn from_iter<I: IntoIterator<Item = OverrideEntry>>(iter: I) -> Self {
        let mut overrides = Overrides::new();
        for entry in iter {
            overrides.insert(entry.row, entry.column, entry.value);
        }
        overrides
    }
}

impl Extend<OverrideEntry> for Overrides {
    fn extend<I: IntoIterator<Item = OverrideEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(entry.row, entry.column, entry.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_edit() {
        let entry = Overrides::parse_edit("3:vat_amount=15.00").unwrap();
        assert_eq!(entry.row, 3);
        assert_eq!(entry.column, Column::VatAmount);
        assert_eq!(entry.value, "15.00");

        let entry = Overrides::parse_edit("0:invoice_number=A=B").unwrap();
        assert_eq!(entry.value, "A=B");

        let entry = Overrides::parse_edit("1:subtotal=").unwrap();
        assert_eq!(entry.value, "");
    }

    #[test]
    fn test_parse_edit_rejects_malformed() {
        assert!(Overrides::parse_edit("total_amount=1").is_err());
        assert!(Overrides::parse_edit("x:total_amount=1").is_err());
        assert!(Overrides::parse_edit("0:price=1").is_err());
        assert!(Overrides::parse_edit("0:total_amount").is_err());
    }

    #[test]
    fn test_from_json_last_edit_wins() {
        let overrides = Overrides::from_json(
            r#"[
                {"row": 0, "column": "total_amount", "value": "1.00"},
                {"row": 0, "column": "total_amount", "value": "2.00"},
                {"row": 1, "column": "invoice_date", "value": "2024-02-01"}
            ]"#,
        )
        .unwrap();

        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides.get(0, Column::TotalAmount), Some("2.00"));
        assert_eq!(overrides.get(1, Column::InvoiceDate), Some("2024-02-01"));
    }
}
