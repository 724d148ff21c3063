//! Optional enrichment pass.
//!
//! An [`Enricher`] is a secondary extractor (typically a language model
//! behind some transport) that may supply fields the heuristic matcher
//! left absent. It never replaces a heuristic value.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::EnrichmentError;
use crate::models::invoice::InvoiceFields;

use super::rules::canonical_amount;

/// Values that models emit when they found nothing.
const PLACEHOLDERS: &[&str] = &[
    "", "not found", "n/a", "na", "none", "null", "unknown", "error", "-",
];

/// Strategy interface for the enrichment pass.
///
/// Implementations own their transport. Errors are downgraded to
/// per-document warnings by the orchestrator.
pub trait Enricher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str {
        "enricher"
    }

    /// Produce fields for the given document text.
    fn enrich(&self, text: &str) -> Result<EnrichedFields, EnrichmentError>;
}

/// Field record returned by an enricher.
///
/// Accepts the long column names and the short `total`/`vat` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnrichedFields {
    #[serde(default, alias = "number", deserialize_with = "lenient_string")]
    pub invoice_number: Option<String>,

    #[serde(default, alias = "date", deserialize_with = "lenient_string")]
    pub invoice_date: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub subtotal: Option<String>,

    #[serde(default, alias = "vat", alias = "tax", deserialize_with = "lenient_string")]
    pub vat_amount: Option<String>,

    #[serde(default, alias = "total", deserialize_with = "lenient_string")]
    pub total_amount: Option<String>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn is_placeholder(value: &str) -> bool {
    let lowered = value.trim().to_lowercase();
    PLACEHOLDERS.contains(&lowered.as_str())
}

impl EnrichedFields {
    /// Drop placeholders and canonicalise amounts.
    ///
    /// Amounts that fail normalization are dropped, like any other
    /// unparsable amount.
    pub fn into_fields(self) -> InvoiceFields {
        let text = |v: Option<String>| {
            v.map(|s| s.trim().to_string())
                .filter(|s| !is_placeholder(s))
        };
        let amount = |v: Option<String>| text(v).and_then(|s| canonical_amount(&s));

        InvoiceFields {
            invoice_number: text(self.invoice_number),
            invoice_date: text(self.invoice_date),
            subtotal: amount(self.subtotal),
            vat_amount: amount(self.vat_amount),
            total_amount: amount(self.total_amount),
        }
    }
}

/// Instruction prompt asking a model for the five fields as JSON.
pub fn enrichment_prompt(invoice_text: &str) -> String {
    format!(
        "You are an expert at extracting fields from invoice text. \
         Analyze the following invoice text carefully.\n\
         Identify the invoice number, the invoice date, the subtotal before tax, \
         the VAT (tax) amount and the final total (grand total or amount due).\n\
         Be accurate and do not guess. \
         Use an empty string for anything that is not present.\n\
         Output only JSON in this exact format: \
         {{\"invoice_number\": \"\", \"invoice_date\": \"\", \"subtotal\": \"\", \
         \"vat_amount\": \"\", \"total_amount\": \"\"}}\n\
         Invoice text: {invoice_text}"
    )
}

/// Parse free model output into a field record.
///
/// The first `{` through the last `}` is decoded as JSON, so chatter around
/// the object is tolerated.
pub fn parse_model_output(raw: &str) -> Result<EnrichedFields, EnrichmentError> {
    let start = raw
        .find('{')
        .ok_or_else(|| EnrichmentError::Malformed("no JSON object in output".to_string()))?;
    let end = raw
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| EnrichmentError::Malformed("unterminated JSON object".to_string()))?;

    serde_json::from_str(&raw[start..=end]).map_err(|e| EnrichmentError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_short_keys() {
        let parsed = parse_model_output(r#" {"total": "$1,437.50", "vat": "187.50"} "#).unwrap();
        let fields = parsed.into_fields();

        assert_eq!(fields.total_amount.as_deref(), Some("1437.50"));
        assert_eq!(fields.vat_amount.as_deref(), Some("187.50"));
        assert_eq!(fields.invoice_number, None);
    }

    #[test]
    fn test_parse_with_chatter_and_numbers() {
        let raw = concat!(
            "Sure! Here is the data:\n",
            r#"{"invoice_number": "INV-7", "invoice_date": "2024-01-02", "subtotal": 100, "#,
            r#""vat_amount": "Not found", "total_amount": null}"#,
            "\nLet me know if you need anything else."
        );

        let fields = parse_model_output(raw).unwrap().into_fields();

        assert_eq!(
            fields,
            InvoiceFields {
                invoice_number: Some("INV-7".to_string()),
                invoice_date: Some("2024-01-02".to_string()),
                subtotal: Some("100".to_string()),
                vat_amount: None,
                total_amount: None,
            }
        );
    }

    #[test]
    fn test_unparsable_amount_dropped() {
        let fields = parse_model_output(r#"{"total": "about a thousand"}"#)
            .unwrap()
            .into_fields();
        assert_eq!(fields.total_amount, None);
    }

    #[test]
    fn test_malformed_output() {
        assert!(matches!(
            parse_model_output("I could not find the totals."),
            Err(EnrichmentError::Malformed(_))
        ));
        assert!(matches!(
            parse_model_output("{\"total\": "),
            Err(EnrichmentError::Malformed(_))
        ));
        assert!(matches!(
            parse_model_output("} oops {"),
            Err(EnrichmentError::Malformed(_))
        ));
    }

    #[test]
    fn test_prompt_embeds_text() {
        let prompt = enrichment_prompt("Total 10.00");
        assert!(prompt.ends_with("Invoice text: Total 10.00"));
        assert!(prompt.contains(r#""total_amount": """#));
    }
}
