//! Default pattern tables and regex builders for invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ConfigError;

/// Currency symbols that may prefix an amount (rand, dollar, euro, pound).
pub const DEFAULT_CURRENCY_SYMBOLS: &[&str] = &["R", "$", "€", "£"];

/// Invoice number labels.
pub const DEFAULT_INVOICE_NUMBER_LABELS: &[&str] = &[
    r"invoice\s*(?:number|no)\.?",
    r"inv(?:\.|o)?\s*#",
    r"invoice\s*#",
];

/// Weak invoice number label, only tried near the top of the document.
pub const DEFAULT_INVOICE_NUMBER_FALLBACK_LABEL: &str = r"\binvoice";

/// Invoice date labels.
pub const DEFAULT_DATE_LABELS: &[&str] = &[r"invoice\s+date", r"issue\s+date", r"date"];

/// Date shapes: D/M/Y, Y/M/D and "Mon D, Y".
pub const DEFAULT_DATE_SHAPES: &[&str] = &[
    r"\b\d{1,2}[/\-.\s]\d{1,2}[/\-.\s]\d{2,4}\b",
    r"\b\d{4}[/\-.\s]\d{1,2}[/\-.\s]\d{1,2}\b",
    r"\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*\s+\d{1,2},?\s*\d{4}\b",
];

/// Total keywords.
pub const DEFAULT_TOTAL_KEYWORDS: &[&str] = &[
    "total due",
    "amount due",
    "invoice total",
    "grand total",
    "total:",
    "total",
];

/// VAT/tax keywords.
pub const DEFAULT_VAT_KEYWORDS: &[&str] = &["vat", "tax", "vat amount", "tax amt", "vat:"];

/// Subtotal keywords.
pub const DEFAULT_SUBTOTAL_KEYWORDS: &[&str] =
    &["subtotal", "sub total", "net total", "net amount"];

lazy_static! {
    /// Amount pattern built from the default currency symbols.
    pub static ref AMOUNT_PATTERN: Regex = amount_regex(DEFAULT_CURRENCY_SYMBOLS)
        .expect("default amount pattern compiles");

    /// A normalized amount string that can be handed to the decimal parser.
    pub static ref DECIMAL_LITERAL: Regex = Regex::new(
        r"^-?(?:\d+(?:\.\d*)?|\.\d+)$"
    ).unwrap();

    /// Date fragments split into numeric/alphabetic parts.
    pub static ref DATE_PARTS: Regex = Regex::new(r"[A-Za-z]+|\d+").unwrap();
}

/// Build the currency-like amount pattern.
///
/// Optional currency symbol, optional sign, then either 1-3 digits with
/// comma/space separated groups of three or a plain digit run, then an
/// optional 1-2 digit fraction.
pub fn amount_regex<S: AsRef<str>>(symbols: &[S]) -> Result<Regex, ConfigError> {
    let symbols: Vec<String> = symbols
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .map(regex::escape)
        .collect();

    let prefix = if symbols.is_empty() {
        String::new()
    } else {
        format!(r"(?:(?:{})\s*)?", symbols.join("|"))
    };

    compile(
        "currency_symbols",
        &format!(r"{prefix}[-+]?(?:\d{{1,3}}(?:[,\s]\d{{3}})+|\d+)(?:\.\d{{1,2}})?"),
    )
}

/// Join regex fragments into a non-capturing alternation.
pub fn alternation<S: AsRef<str>>(
    name: &'static str,
    fragments: &[S],
) -> Result<String, ConfigError> {
    let parts: Vec<&str> = fragments
        .iter()
        .map(|f| f.as_ref().trim())
        .filter(|f| !f.is_empty())
        .collect();

    if parts.is_empty() {
        return Err(ConfigError::EmptyTable(name));
    }

    // Validate each fragment on its own so errors name the table.
    for part in &parts {
        compile(name, part)?;
    }

    Ok(format!("(?:{})", parts.join("|")))
}

/// Build a case-insensitive keyword matcher with word boundaries.
///
/// Longer keywords are tried first so "vat amount" is preferred over "vat".
pub fn keyword_regex<S: AsRef<str>>(
    name: &'static str,
    keywords: &[S],
) -> Result<Regex, ConfigError> {
    let mut keywords: Vec<&str> = keywords
        .iter()
        .map(|k| k.as_ref().trim())
        .filter(|k| !k.is_empty())
        .collect();

    if keywords.is_empty() {
        return Err(ConfigError::EmptyTable(name));
    }

    keywords.sort_by_key(|k| std::cmp::Reverse(k.len()));

    let parts: Vec<String> = keywords
        .iter()
        .map(|k| {
            let mut part = String::new();
            if k.starts_with(|c: char| c.is_alphanumeric()) {
                part.push_str(r"\b");
            }
            part.push_str(&regex::escape(k));
            if k.ends_with(|c: char| c.is_alphanumeric()) {
                part.push_str(r"\b");
            }
            part
        })
        .collect();

    compile(name, &format!("(?i)(?:{})", parts.join("|")))
}

pub(crate) fn compile(name: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern { name, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_pattern_shapes() {
        let found: Vec<&str> = AMOUNT_PATTERN
            .find_iter("Paid $1,250.00 and R 300 then €9500.5 or -12.30")
            .map(|m| m.as_str())
            .collect();

        assert_eq!(found, vec!["$1,250.00", "R 300", "€9500.5", "-12.30"]);
    }

    #[test]
    fn test_keyword_regex_word_boundaries() {
        let total = keyword_regex("total_keywords", DEFAULT_TOTAL_KEYWORDS).unwrap();

        assert!(total.is_match("TOTAL: 10.00"));
        assert!(total.is_match("Grand Total 10.00"));
        assert!(!total.is_match("Subtotal 10.00"));
        assert!(!total.is_match("Totally unrelated"));
    }

    #[test]
    fn test_empty_table_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            keyword_regex("vat_keywords", &empty),
            Err(ConfigError::EmptyTable("vat_keywords"))
        ));
        assert!(alternation("date_labels", &["  "]).is_err());
    }

    #[test]
    fn test_invalid_fragment_names_table() {
        let err = alternation("date_shapes", &[r"\d{2", r"\d+"]).unwrap_err();
        assert!(err.to_string().contains("date_shapes"));
    }
}
