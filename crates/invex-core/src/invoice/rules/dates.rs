//! Invoice date extraction.

use chrono::NaiveDate;
use regex::Regex;

use super::patterns::{alternation, compile, DATE_PARTS, DEFAULT_DATE_LABELS, DEFAULT_DATE_SHAPES};
use super::{ExtractionMatch, FieldExtractor};
use crate::error::ConfigError;

/// Date field extractor over a window of leading lines.
#[derive(Debug, Clone)]
pub struct DateExtractor {
    /// Label followed by a date, case-insensitive.
    labeled: Regex,
    /// Any date shape, case-sensitive.
    bare: Regex,
    /// Number of lines searched.
    max_lines: usize,
}

impl DateExtractor {
    /// Extractor with the default labels and shapes over the first 40 lines.
    pub fn new() -> Self {
        Self::from_tables(DEFAULT_DATE_LABELS, DEFAULT_DATE_SHAPES, 40)
            .expect("default date tables compile")
    }

    /// Build from label and shape tables.
    pub fn from_tables<L: AsRef<str>, S: AsRef<str>>(
        labels: &[L],
        shapes: &[S],
        max_lines: usize,
    ) -> Result<Self, ConfigError> {
        let labels = alternation("date_labels", labels)?;
        let shapes = alternation("date_shapes", shapes)?;

        Ok(Self {
            labeled: compile("date_labels", &format!(r"(?i){labels}[:\s]*(?P<date>{shapes})"))?,
            bare: compile("date_shapes", &shapes)?,
            max_lines,
        })
    }

    /// Find the invoice date in already-trimmed, non-empty lines.
    ///
    /// A labeled date anywhere in the window wins over a bare date.
    pub fn find_in_lines(&self, lines: &[&str]) -> Option<ExtractionMatch<String>> {
        let window = &lines[..lines.len().min(self.max_lines)];

        let labeled = window.iter().enumerate().find_map(|(i, line)| {
            let caps = self.labeled.captures(line)?;
            let date = caps.name("date")?.as_str().trim();
            Some(ExtractionMatch::new(date.to_string(), 0.95, *line).with_line(i))
        });

        labeled.or_else(|| {
            window.iter().enumerate().find_map(|(i, line)| {
                let m = self.bare.find(line)?;
                Some(ExtractionMatch::new(m.as_str().trim().to_string(), 0.6, *line).with_line(i))
            })
        })
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
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

/// Parse a matched date string into a calendar date.
///
/// Numeric dates are read day-first unless the first part has four digits.
/// Two-digit years map 00-50 to 2000s and 51-99 to 1900s.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = DATE_PARTS.find_iter(raw).map(|m| m.as_str()).collect();
    if parts.len() != 3 {
        return None;
    }

    if let Some(month) = month_from_name(parts[0]) {
        let day: u32 = parts[1].parse().ok()?;
        let year: i32 = parts[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let numbers: Vec<u32> = parts.iter().map(|p| p.parse().ok()).collect::<Option<_>>()?;

    if parts[0].len() == 4 {
        NaiveDate::from_ymd_opt(numbers[0] as i32, numbers[1], numbers[2])
    } else {
        NaiveDate::from_ymd_opt(parse_year(parts[2])?, numbers[1], numbers[0])
    }
}

fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    Some(match (s.len(), year) {
        (1 | 2, 0..=50) => 2000 + year,
        (1 | 2, _) => 1900 + year,
        _ => year,
    })
}

fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
