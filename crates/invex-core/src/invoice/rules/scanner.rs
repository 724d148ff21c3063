//! Currency-like amount scanning.

use regex::Regex;
use rust_decimal::Decimal;

use super::amounts::to_decimal;
use super::patterns::{amount_regex, AMOUNT_PATTERN};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::ConfigError;

/// A substring matched by the amount pattern, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAmountToken<'a> {
    /// Matched text, currency symbol included.
    pub text: &'a str,
    /// Zero-based index among the trimmed, non-empty lines of the text.
    pub line: usize,
}

impl RawAmountToken<'_> {
    /// Normalize the token; `None` drops it as unparsable.
    pub fn value(&self) -> Option<Decimal> {
        to_decimal(self.text)
    }
}

/// Finds currency-like amounts in text.
#[derive(Debug, Clone)]
pub struct AmountScanner {
    pattern: Regex,
}

impl AmountScanner {
    /// Scanner using the default currency symbols.
    pub fn new() -> Self {
        Self {
            pattern: AMOUNT_PATTERN.clone(),
        }
    }

    /// Scanner recognising the given currency symbols.
    pub fn with_symbols<S: AsRef<str>>(symbols: &[S]) -> Result<Self, ConfigError> {
        Ok(Self {
            pattern: amount_regex(symbols)?,
        })
    }

    /// The compiled amount pattern.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Raw tokens in order of appearance. Numbers immediately followed by
    /// `%` are rates, not amounts, and are skipped. Blank lines are not
    /// counted in token line numbers.
    pub fn tokens<'a>(&'a self, text: &'a str) -> impl Iterator<Item = RawAmountToken<'a>> + 'a {
        let lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
        lines.enumerate().flat_map(move |(line_no, line)| {
            self.pattern.find_iter(line).filter_map(move |m| {
                if line[m.end()..].trim_start().starts_with('%') {
                    return None;
                }
                Some(RawAmountToken {
                    text: m.as_str(),
                    line: line_no,
                })
            })
        })
    }

    /// First token on a single line, normalized. An unparsable first token
    /// yields `None` rather than falling through to later tokens.
    pub fn first_on_line(&self, line: &str) -> Option<ExtractionMatch<Decimal>> {
        let token = self.tokens(line).next()?;
        let value = token.value()?;
        Some(ExtractionMatch::new(value, 0.95, token.text.trim()))
    }

    /// All amounts with their raw text, in order of appearance.
    pub fn find_amounts(&self, text: &str) -> Vec<(String, Decimal)> {
        self.extract_all(text)
            .into_iter()
            .map(|m| (m.source, m.value))
            .collect()
    }

    /// The largest amount; the first occurrence wins on ties.
    pub fn largest(&self, text: &str) -> Option<ExtractionMatch<Decimal>> {
        self.extract_all(text).into_iter().fold(None, |best, m| match best {
            Some(b) if b.value >= m.value => Some(b),
            _ => Some(m),
        })
    }
}

impl Default for AmountScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountScanner {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.tokens(text)
            .filter_map(|token| {
                let value = token.value()?;
                Some(ExtractionMatch::new(value, 0.5, token.text.trim()).with_line(token.line))
            })
            .collect()
    }
}
