//! Loosely-typed intake form payload.
//!
//! The wizard hands over a flat key/value object. Only a handful of keys
//! are read here; everything else is carried through untouched so a
//! profile can be reconstructed later.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FARMER_NAME: &str = "farmerName";
pub const SPECIES: &str = "species";
pub const LIVESTOCK_COUNT: &str = "livestockCount";
pub const HERD_VALUE: &str = "herdValue";
pub const USE_CASE: &str = "useCase";
pub const SELECTED_MODULES: &str = "selectedModules";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(Map<String, Value>);

impl FormData {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Trimmed, non-empty text for `key`. Numbers and booleans are rendered.
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Numeric value for `key`, accepting numbers or numeric strings.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// List value for `key`: an array of strings, or a comma-separated string.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Number of keys holding something other than null, blank text, or an empty list.
    pub fn filled_fields(&self) -> usize {
        self.0
            .values()
            .filter(|v| match v {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                Value::Array(a) => !a.is_empty(),
                Value::Object(o) => !o.is_empty(),
                _ => true,
            })
            .count()
    }

    /// Entries sorted by key.
    pub fn sorted_entries(&self) -> Vec<(&String, &Value)> {
        let mut entries: Vec<_> = self.0.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for FormData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> FormData {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn reads_numbers_from_strings() {
        let f = form(json!({ "livestockCount": "120", "herdValue": "1,500,000" }));
        assert_eq!(f.number(LIVESTOCK_COUNT), Some(120.0));
        assert_eq!(f.number(HERD_VALUE), Some(1_500_000.0));
        assert_eq!(f.number("missing"), None);
    }

    #[test]
    fn list_accepts_array_or_csv_string() {
        let a = form(json!({ "selectedModules": ["credit", " insurance ", ""] }));
        assert_eq!(a.list(SELECTED_MODULES), vec!["credit", "insurance"]);
        let b = form(json!({ "selectedModules": "credit, valuation" }));
        assert_eq!(b.list(SELECTED_MODULES), vec!["credit", "valuation"]);
    }

    #[test]
    fn filled_fields_skips_blanks() {
        let f = form(json!({
            "farmerName": "Amina",
            "species": "  ",
            "notes": null,
            "selectedModules": [],
            "livestockCount": 40
        }));
        assert_eq!(f.filled_fields(), 2);
        assert_eq!(f.text(SPECIES), None);
        assert_eq!(f.text(LIVESTOCK_COUNT).as_deref(), Some("40"));
    }
}
