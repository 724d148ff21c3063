//! Amount normalization.
//!
//! Turns a raw currency-like substring into an exact decimal. Binary
//! floating point is never involved.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::DECIMAL_LITERAL;

/// Normalize a raw amount to a plain decimal string.
///
/// Keeps digits, `.`, `,` and `-`. When both `,` and `.` occur, commas are
/// thousands separators and are dropped; a lone `,` (no `.`) is the
/// decimal separator. Double minus signs collapse to one.
///
/// Returns `None` when nothing numeric-looking remains.
pub fn normalize_amount(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    let unified = if cleaned.contains(',') && cleaned.contains('.') {
        cleaned.replace(',', "")
    } else if cleaned.contains(',') {
        cleaned.replace(',', ".")
    } else {
        cleaned
    };

    Some(unified.replace("--", "-"))
}

/// Normalize and parse a raw amount.
///
/// Returns `None` for non-numeric residue, an empty string or more than one
/// decimal point.
pub fn to_decimal(raw: &str) -> Option<Decimal> {
    let normalized = normalize_amount(raw)?;
    parse_normalized(&normalized)
}

/// Canonical string for a raw amount, e.g. `"$1,250.00"` -> `"1250.00"`.
pub fn canonical_amount(raw: &str) -> Option<String> {
    to_decimal(raw).map(|d| d.to_string())
}

fn parse_normalized(s: &str) -> Option<Decimal> {
    if !DECIMAL_LITERAL.is_match(s) {
        return None;
    }

    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let digits = digits.strip_suffix('.').unwrap_or(digits);
    let literal = if digits.starts_with('.') {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };

    let value = Decimal::from_str(&literal).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_separator_disambiguation() {
        assert_eq!(to_decimal("1,234.56"), Some(dec("1234.56")));
        assert_eq!(to_decimal("1234,56"), Some(dec("1234.56")));
        // single comma without a dot is a decimal separator
        assert_eq!(to_decimal("1,234"), Some(dec("1.234")));
        assert_eq!(to_decimal("12,345,678.90"), Some(dec("12345678.90")));
    }

    #[test]
    fn test_currency_and_spaces_stripped() {
        assert_eq!(to_decimal("$ 1,250.00"), Some(dec("1250.00")));
        assert_eq!(to_decimal("R 1 250.00"), Some(dec("1250.00")));
        assert_eq!(to_decimal("R 1\u{a0}250.00"), Some(dec("1250.00")));
        assert_eq!(to_decimal("1\u{202f}250\t000"), Some(dec("1250000")));
        assert_eq!(to_decimal("€99"), Some(dec("99")));
        assert_eq!(to_decimal("+15.5"), Some(dec("15.5")));
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(to_decimal("-42.10"), Some(dec("-42.10")));
        assert_eq!(normalize_amount("--5"), Some("-5".to_string()));
        assert_eq!(to_decimal("--5"), Some(dec("-5")));
    }

    #[test]
    fn test_unparsable_amounts() {
        assert_eq!(normalize_amount("abc"), None);
        assert_eq!(to_decimal(""), None);
        assert_eq!(to_decimal("USD"), None);
        // several commas and no dot become several decimal points
        assert_eq!(to_decimal("1,234,567"), None);
        assert_eq!(to_decimal("1.2.3"), None);
        assert_eq!(to_decimal("10-20"), None);
        assert_eq!(to_decimal("-"), None);
    }

    #[test]
    fn test_loose_decimal_points() {
        assert_eq!(to_decimal(".5"), Some(dec("0.5")));
        assert_eq!(to_decimal("7."), Some(dec("7")));
    }

    #[test]
    fn test_canonical_keeps_scale() {
        assert_eq!(canonical_amount("$1,250.00").as_deref(), Some("1250.00"));
        assert_eq!(canonical_amount("0100").as_deref(), Some("100"));
        assert_eq!(canonical_amount("12,5").as_deref(), Some("12.5"));
    }

    #[test]
    fn test_exact_decimal_sum() {
        let sum = to_decimal("0.10").unwrap() + to_decimal("0.20").unwrap();
        assert_eq!(sum.to_string(), "0.30");
    }
}
