//! Superficial document digests.
//!
//! Nothing here understands a document. PDF text is scanned for date-like
//! substrings and a few topic keywords; tabular data is reduced to per-column
//! sums of the cells that look like numbers.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::{ExtractedData, NumericSummary, Topic};

lazy_static! {
    static ref DATE_RE: Regex =
        Regex::new(r"\b(?:\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}-\d{2}-\d{2})\b").unwrap();
    static ref TOPIC_RES: [(Topic, Regex); 3] = [
        (Topic::Balance, Regex::new(r"(?i)balance").unwrap()),
        (Topic::Income, Regex::new(r"(?i)income").unwrap()),
        (Topic::Expense, Regex::new(r"(?i)expense").unwrap()),
    ];
}

/// Derives [`ExtractedData`] from the full, untruncated document text.
///
/// Dates are kept in order of first appearance without duplicates. A topic
/// is recorded once if its keyword matches anywhere.
pub fn extract_data(text: &str) -> ExtractedData {
    let mut dates: Vec<String> = Vec::new();
    for m in DATE_RE.find_iter(text) {
        if !dates.iter().any(|d| d == m.as_str()) {
            dates.push(m.as_str().to_string());
        }
    }

    let mentions = TOPIC_RES
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(topic, _)| *topic)
        .collect();

    ExtractedData { dates, mentions }
}

/// Permissive numeric test: any non-blank value that parses as a finite
/// float, exponent forms like `1e3` included.
pub fn parse_numeric(value: &str) -> Option<f64> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    v.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Running per-column sums over tabular cells.
///
/// Blank and non-numeric cells are skipped; a column with no numeric cell
/// never appears in the summary. A cell that would push a sum past the
/// range of `f64` is skipped too, so every sum stays finite.
#[derive(Debug, Default)]
pub struct ColumnSums {
    sums: NumericSummary,
}

impl ColumnSums {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, column: &str, value: &str) {
        if let Some(n) = parse_numeric(value) {
            let sum = self.sums.entry(column.to_string()).or_insert(0.0);
            let next = *sum + n;
            if next.is_finite() {
                *sum = next;
            }
        }
    }

    /// Finishes the summary, ordered by `headers`.
    pub fn finish(mut self, headers: &[String]) -> NumericSummary {
        let mut ordered = NumericSummary::with_capacity(self.sums.len());
        for h in headers {
            if let Some(sum) = self.sums.shift_remove(h) {
                ordered.insert(h.clone(), sum);
            }
        }
        ordered.extend(self.sums);
        ordered
    }
}

/// Truncates `text` to at most `max_chars` characters.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
