//! Labeled field search: invoice numbers and monetary keyword lines.

use std::fmt;

use regex::Regex;

use super::patterns::{
    alternation, compile, keyword_regex, DEFAULT_INVOICE_NUMBER_FALLBACK_LABEL,
    DEFAULT_INVOICE_NUMBER_LABELS, DEFAULT_SUBTOTAL_KEYWORDS, DEFAULT_TOTAL_KEYWORDS,
    DEFAULT_VAT_KEYWORDS,
};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::ConfigError;

/// Invoice number extractor.
#[derive(Debug, Clone)]
pub struct InvoiceNumberExtractor {
    labeled: Regex,
    fallback: Regex,
    fallback_lines: usize,
}

impl InvoiceNumberExtractor {
    pub fn new() -> Self {
        Self::from_tables(
            DEFAULT_INVOICE_NUMBER_LABELS,
            DEFAULT_INVOICE_NUMBER_FALLBACK_LABEL,
            30,
        )
        .expect("default invoice number tables compile")
    }

    /// Build from a label table and the weaker fallback label.
    pub fn from_tables<S: AsRef<str>>(
        labels: &[S],
        fallback_label: &str,
        fallback_lines: usize,
    ) -> Result<Self, ConfigError> {
        let labels = alternation("invoice_number_labels", labels)?;
        let fallback_label = alternation("invoice_number_fallback_label", &[fallback_label])?;
        let token = r"[A-Z0-9][A-Z0-9\-/]*";
        let boundary = r"(?:[^A-Za-z0-9\-/]|$)";

        Ok(Self {
            labeled: compile(
                "invoice_number_labels",
                &format!(r"(?i){labels}[:\s]*(?-i:(?P<number>[A-Z0-9\-/]+))"),
            )?,
            // The token must be maximal so "Invoice Date" does not yield "D".
            fallback: compile(
                "invoice_number_fallback_label",
                &format!(r"(?i){fallback_label}[:\s]*(?-i:(?P<number>{token})){boundary}"),
            )?,
            fallback_lines,
        })
    }

    /// Find the invoice number in already-trimmed, non-empty lines.
    pub fn find_in_lines(&self, lines: &[&str]) -> Option<ExtractionMatch<String>> {
        let labeled = lines.iter().enumerate().find_map(|(i, line)| {
            let caps = self.labeled.captures(line)?;
            let number = caps.name("number")?.as_str();
            Some(ExtractionMatch::new(number.to_string(), 0.95, *line).with_line(i))
        });

        labeled.or_else(|| {
            lines
                .iter()
                .take(self.fallback_lines)
                .enumerate()
                .find_map(|(i, line)| {
                    self.fallback
                        .captures_iter(line)
                        .filter_map(|caps| caps.name("number"))
                        .map(|m| m.as_str())
                        .find(|n| n.chars().any(|c| c.is_ascii_digit()))
                        .map(|n| ExtractionMatch::new(n.to_string(), 0.6, *line).with_line(i))
                })
        })
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = ExtractionMatch<String>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        self.find_in_lines(&lines)
    }
}

/// Monetary fields located by keyword lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoneyField {
    Total,
    Vat,
    Subtotal,
}

impl MoneyField {
    pub const ALL: [MoneyField; 3] = [MoneyField::Total, MoneyField::Vat, MoneyField::Subtotal];
}

impl fmt::Display for MoneyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MoneyField::Total => "total",
            MoneyField::Vat => "vat",
            MoneyField::Subtotal => "subtotal",
        })
    }
}

/// Keyword sets for the monetary fields.
#[derive(Debug, Clone)]
pub struct KeywordTable {
    total: Regex,
    vat: Regex,
    subtotal: Regex,
}

impl KeywordTable {
    pub fn new() -> Self {
        Self::from_tables(
            DEFAULT_TOTAL_KEYWORDS,
            DEFAULT_VAT_KEYWORDS,
            DEFAULT_SUBTOTAL_KEYWORDS,
        )
        .expect("default keyword tables compile")
    }

    pub fn from_tables<S: AsRef<str>>(
        total: &[S],
        vat: &[S],
        subtotal: &[S],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            total: keyword_regex("total_keywords", total)?,
            vat: keyword_regex("vat_keywords", vat)?,
            subtotal: keyword_regex("subtotal_keywords", subtotal)?,
        })
    }

    fn regex(&self, field: MoneyField) -> &Regex {
        match field {
            MoneyField::Total => &self.total,
            MoneyField::Vat => &self.vat,
            MoneyField::Subtotal => &self.subtotal,
        }
    }

    /// Fields whose keywords occur on `line`.
    ///
    /// Each field is tested independently. A hit is discarded when it
    /// overlaps a strictly longer hit of another field, so "Sub Total:"
    /// counts as a subtotal and not as a total. A bare one-word total hit
    /// ("Total" with no colon or qualifier) yields to any other field on
    /// the line, so "Total VAT 15.00" is a VAT line only.
    pub fn fields_on_line(&self, line: &str) -> Vec<MoneyField> {
        let hits: Vec<(MoneyField, usize, usize)> = MoneyField::ALL
            .into_iter()
            .flat_map(|field| {
                self.regex(field)
                    .find_iter(line)
                    .map(move |m| (field, m.start(), m.end()))
            })
            .collect();

        let shadowed = |field: MoneyField, start: usize, end: usize| {
            hits.iter().any(|&(other, s, e)| {
                other != field && s < end && start < e && (e - s) > (end - start)
            })
        };
        let bare_total = |field: MoneyField, start: usize, end: usize| {
            field == MoneyField::Total
                && line[start..end].chars().all(char::is_alphanumeric)
                && hits.iter().any(|&(other, _, _)| other != MoneyField::Total)
        };

        MoneyField::ALL
            .into_iter()
            .filter(|&field| {
                hits.iter()
                    .filter(|&&(f, _, _)| f == field)
                    .any(|&(_, start, end)| {
                        !shadowed(field, start, end) && !bare_total(field, start, end)
                    })
            })
            .collect()
    }
}

impl Default for KeywordTable {
    fn default() -> Self {
        Self::new()
    }
}
