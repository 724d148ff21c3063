//! Label-value matcher: the heuristic single pass over one document.

use rust_decimal::Decimal;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::models::config::{ExtractionConfig, PatternConfig};
use crate::models::invoice::InvoiceFields;

use super::rules::{
    normalize_date, AmountScanner, DateExtractor, ExtractionMatch, InvoiceNumberExtractor,
    KeywordTable, MoneyField,
};

/// Matches for one document before conversion to strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMatches {
    pub invoice_number: Option<ExtractionMatch<String>>,
    pub invoice_date: Option<ExtractionMatch<String>>,
    pub subtotal: Option<ExtractionMatch<Decimal>>,
    pub vat_amount: Option<ExtractionMatch<Decimal>>,
    pub total_amount: Option<ExtractionMatch<Decimal>>,
    /// The total came from the largest-amount fallback.
    pub total_from_fallback: bool,
}

impl FieldMatches {
    fn money_slot(&mut self, field: MoneyField) -> &mut Option<ExtractionMatch<Decimal>> {
        match field {
            MoneyField::Total => &mut self.total_amount,
            MoneyField::Vat => &mut self.vat_amount,
            MoneyField::Subtotal => &mut self.subtotal,
        }
    }

    /// Convert to canonical strings. Dates are rewritten as ISO-8601 when
    /// `normalize_dates` is set and the date parses.
    pub fn into_fields(self, normalize_dates: bool) -> InvoiceFields {
        let invoice_date = self.invoice_date.map(|m| {
            if normalize_dates {
                normalize_date(&m.value)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or(m.value)
            } else {
                m.value
            }
        });

        InvoiceFields {
            invoice_number: self.invoice_number.map(|m| m.value),
            invoice_date,
            subtotal: self.subtotal.map(|m| m.value.to_string()),
            vat_amount: self.vat_amount.map(|m| m.value.to_string()),
            total_amount: self.total_amount.map(|m| m.value.to_string()),
        }
    }
}

/// Heuristic matcher built from declarative pattern tables.
///
/// Holds only compiled patterns, so repeated calls on the same text give
/// the same result.
#[derive(Debug, Clone)]
pub struct LabelMatcher {
    numbers: InvoiceNumberExtractor,
    dates: DateExtractor,
    keywords: KeywordTable,
    scanner: AmountScanner,
    total_fallback: bool,
    normalize_dates: bool,
}

impl LabelMatcher {
    /// Matcher with the default pattern tables.
    pub fn new() -> Self {
        Self {
            numbers: InvoiceNumberExtractor::new(),
            dates: DateExtractor::new(),
            keywords: KeywordTable::new(),
            scanner: AmountScanner::new(),
            total_fallback: true,
            normalize_dates: false,
        }
    }

    /// Compile a matcher from configuration.
    pub fn from_config(
        patterns: &PatternConfig,
        extraction: &ExtractionConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            numbers: InvoiceNumberExtractor::from_tables(
                &patterns.invoice_number_labels,
                &patterns.invoice_number_fallback_label,
                patterns.invoice_number_fallback_lines,
            )?,
            dates: DateExtractor::from_tables(
                &patterns.date_labels,
                &patterns.date_shapes,
                patterns.date_lines,
            )?,
            keywords: KeywordTable::from_tables(
                &patterns.total_keywords,
                &patterns.vat_keywords,
                &patterns.subtotal_keywords,
            )?,
            scanner: AmountScanner::with_symbols(&patterns.currency_symbols)?,
            total_fallback: extraction.total_fallback_to_largest,
            normalize_dates: extraction.normalize_dates,
        })
    }

    /// Enable or disable the largest-amount total fallback.
    pub fn with_total_fallback(mut self, enabled: bool) -> Self {
        self.total_fallback = enabled;
        self
    }

    /// Enable or disable ISO-8601 date rewriting.
    pub fn with_date_normalization(mut self, enabled: bool) -> Self {
        self.normalize_dates = enabled;
        self
    }

    pub fn normalizes_dates(&self) -> bool {
        self.normalize_dates
    }

    /// Extract the five fields as canonical strings.
    pub fn extract_fields(&self, text: &str) -> InvoiceFields {
        self.extract_matches(text).into_fields(self.normalize_dates)
    }

    /// Run the matching pass, keeping match metadata.
    pub fn extract_matches(&self, text: &str) -> FieldMatches {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        let mut matches = FieldMatches {
            invoice_number: self.numbers.find_in_lines(&lines),
            invoice_date: self.dates.find_in_lines(&lines),
            ..Default::default()
        };

        // Totals and tax lines sit near the end; the bottom-most hit wins.
        for (index, line) in lines.iter().enumerate().rev() {
            for field in self.keywords.fields_on_line(line) {
                let slot = matches.money_slot(field);
                if slot.is_some() {
                    continue;
                }
                trace!("Line {} carries {} keyword: {}", index, field, line);
                if let Some(amount) = self.scanner.first_on_line(line) {
                    *slot = Some(amount.with_line(index));
                }
            }
        }

        if matches.total_amount.is_none() && self.total_fallback {
            if let Some(largest) = self.scanner.largest(text) {
                debug!("No labeled total, using largest amount {}", largest.value);
                matches.total_amount = Some(ExtractionMatch {
                    confidence: 0.4,
                    ..largest
                });
                matches.total_from_fallback = true;
            }
        }

        matches
    }
}

impl Default for LabelMatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INVOICE: &str = r#"
        ACME Supplies Ltd
        TAX INVOICE
        Invoice No: INV-2024-017
        Invoice Date: 15/03/2024

        Description            Qty   Amount
        Paper A4 (box)          10   $450.00
        Toner cartridge          2   $800.00

        Subtotal                     $1,250.00
        VAT (15%)                      $187.50
        Total Due                    $1,437.50
    "#;

    #[test]
    fn test_extract_fields_full_invoice() {
        let fields = LabelMatcher::new().extract_fields(INVOICE);

        assert_eq!(
            fields,
            InvoiceFields {
                invoice_number: Some("INV-2024-017".to_string()),
                invoice_date: Some("15/03/2024".to_string()),
                subtotal: Some("1250.00".to_string()),
                vat_amount: Some("187.50".to_string()),
                total_amount: Some("1437.50".to_string()),
            }
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let matcher = LabelMatcher::new();
        assert_eq!(matcher.extract_fields(INVOICE), matcher.extract_fields(INVOICE));
    }

    #[test]
    fn test_bottom_most_total_wins() {
        let text = "Grand Total: $1,250.00\nNotes\nTotal: $999.00\n";
        let fields = LabelMatcher::new().extract_fields(text);
        assert_eq!(fields.total_amount.as_deref(), Some("999.00"));

        let text = "Total: $999.00\nNotes\nGrand Total: $1,250.00\n";
        let fields = LabelMatcher::new().extract_fields(text);
        assert_eq!(fields.total_amount.as_deref(), Some("1250.00"));
    }

    #[test]
    fn test_total_fallback_to_largest() {
        let text = r#"
            Item A   100.00
            Item B   9500.00
            Item C   250.50
        "#;

        let matches = LabelMatcher::new().extract_matches(text);
        assert!(matches.total_from_fallback);
        assert_eq!(matches.total_amount.unwrap().value.to_string(), "9500.00");

        let fields = LabelMatcher::new().with_total_fallback(false).extract_fields(text);
        assert_eq!(fields.total_amount, None);
    }

    #[test]
    fn test_shared_line_fills_both_fields() {
        let text = "Subtotal 200.00 VAT 30.00\nTotal: 230.00";
        let fields = LabelMatcher::new().extract_fields(text);

        // each field takes the first amount on the line
        assert_eq!(fields.subtotal.as_deref(), Some("200.00"));
        assert_eq!(fields.vat_amount.as_deref(), Some("200.00"));
        assert_eq!(fields.total_amount.as_deref(), Some("230.00"));
    }

    #[test]
    fn test_keyword_line_without_amount_is_skipped() {
        let text = "VAT 40.00\nVAT registration pending\nTotal 340.00";
        let fields = LabelMatcher::new().extract_fields(text);

        assert_eq!(fields.vat_amount.as_deref(), Some("40.00"));
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let fields = LabelMatcher::new().extract_fields("   \n\n");
        assert!(fields.is_empty());
    }

    #[test]
    fn test_date_normalization() {
        let matcher = LabelMatcher::new().with_date_normalization(true);
        let fields = matcher.extract_fields("Date: Mar 5, 2024\nTotal 1.00");
        assert_eq!(fields.invoice_date.as_deref(), Some("2024-03-05"));

        let fields = matcher.extract_fields("Date: 99/99/2024");
        assert_eq!(fields.invoice_date.as_deref(), Some("99/99/2024"));
    }

    #[test]
    fn test_custom_tables() {
        let patterns = PatternConfig {
            vat_keywords: vec!["gst".to_string()],
            currency_symbols: vec!["A$".to_string()],
            ..Default::default()
        };
        let matcher = LabelMatcher::from_config(&patterns, &ExtractionConfig::default()).unwrap();

        let fields = matcher.extract_fields("GST A$ 12.00\nVAT 99.00\nTotal A$132.00");
        assert_eq!(fields.vat_amount.as_deref(), Some("12.00"));
        assert_eq!(fields.total_amount.as_deref(), Some("132.00"));
    }

    #[test]
    fn test_invalid_table_is_config_error() {
        let patterns = PatternConfig {
            date_shapes: vec![r"(\d+".to_string()],
            ..Default::default()
        };
        let err = LabelMatcher::from_config(&patterns, &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { name: "date_shapes", .. }));
    }

    #[test]
    fn test_whitespace_grouped_thousands() {
        let matcher = LabelMatcher::new();

        let fields = matcher.extract_fields("Invoice No: A-1\nTotal Due R 1\u{a0}437.50\n");
        assert_eq!(fields.total_amount.as_deref(), Some("1437.50"));

        let fields = matcher.extract_fields("Subtotal\t1\t250.00\nTotal: 1\u{202f}437.50");
        assert_eq!(fields.subtotal.as_deref(), Some("1250.00"));
        assert_eq!(fields.total_amount.as_deref(), Some("1437.50"));
    }

    #[test]
    fn test_bare_total_on_vat_line() {
        let fields = LabelMatcher::new().extract_fields("Total: 115.00\nTotal VAT 15.00");

        assert_eq!(fields.total_amount.as_deref(), Some("115.00"));
        assert_eq!(fields.vat_amount.as_deref(), Some("15.00"));
    }

    #[test]
    fn test_match_lines_skip_blank_lines() {
        let text = "Item A   100.00\n\n\n   Item B   9500.00\nVAT 12.00";
        let matches = LabelMatcher::new().extract_matches(text);

        assert_eq!(matches.vat_amount.unwrap().line, Some(2));
        let total = matches.total_amount.unwrap();
        assert_eq!(total.value.to_string(), "9500.00");
        assert_eq!(total.line, Some(1));
    }
}
