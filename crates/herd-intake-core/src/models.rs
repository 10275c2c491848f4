//! Core data models used throughout Herd Intake.
//!
//! These types describe what flows out of the ingestion pipeline and into the
//! profile store: per-file results and their typed content, the aggregated
//! insight digest, and the persisted profile record.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::form::FormData;

/// Document-role label an upload is grouped under.
///
/// Ordering follows the intake wizard: identity, banking, herd, health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Id,
    Bank,
    Herd,
    Health,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Id,
        Category::Bank,
        Category::Herd,
        Category::Health,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Id => "id",
            Category::Bank => "bank",
            Category::Herd => "herd",
            Category::Health => "health",
        }
    }

    /// Human-readable label used in reports.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Id => "Identity",
            Category::Bank => "Banking",
            Category::Herd => "Herd records",
            Category::Health => "Animal health",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" | "identity" => Ok(Category::Id),
            "bank" | "banking" => Ok(Category::Bank),
            "herd" => Ok(Category::Herd),
            "health" => Ok(Category::Health),
            other => Err(format!(
                "unknown category '{}'. Must be id, bank, herd, or health",
                other
            )),
        }
    }
}

/// Topic tag recorded when its keyword appears anywhere in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Balance,
    Income,
    Expense,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Balance, Topic::Income, Topic::Expense];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Balance => "balance",
            Topic::Income => "income",
            Topic::Expense => "expense",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Superficial facts pulled from a PDF's full text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    /// Date-like substrings in order of first appearance, without duplicates.
    pub dates: Vec<String>,
    /// Topics whose keyword matched at least once.
    pub mentions: Vec<Topic>,
}

impl ExtractedData {
    pub fn field_count(&self) -> usize {
        self.dates.len() + self.mentions.len()
    }
}

/// Column name → sum of the values in that column that parsed as numbers.
pub type NumericSummary = IndexMap<String, f64>;

/// One CSV data row keyed by header name.
pub type CsvRow = IndexMap<String, String>;

/// Typed payload of a successfully extracted file.
///
/// Each variant carries only its own fields; the `type` tag is the
/// discriminator in serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Pdf {
        pages: usize,
        /// Leading excerpt of the concatenated page text.
        text: String,
        extracted_data: ExtractedData,
    },
    Csv {
        rows: usize,
        headers: Vec<String>,
        preview: Vec<CsvRow>,
        summary: NumericSummary,
    },
    Excel {
        sheets: usize,
        sheet_name: String,
        rows: usize,
        headers: Vec<String>,
        preview: Vec<Vec<String>>,
        summary: NumericSummary,
    },
    Image {
        note: String,
    },
    Unknown {
        note: String,
    },
}

impl Content {
    pub fn kind(&self) -> &'static str {
        match self {
            Content::Pdf { .. } => "pdf",
            Content::Csv { .. } => "csv",
            Content::Excel { .. } => "excel",
            Content::Image { .. } => "image",
            Content::Unknown { .. } => "unknown",
        }
    }

    /// Number of extracted-data fields this content contributes to insights.
    pub fn extracted_fields(&self) -> usize {
        match self {
            Content::Pdf { extracted_data, .. } => extracted_data.field_count(),
            Content::Csv { summary, .. } | Content::Excel { summary, .. } => summary.len(),
            Content::Image { .. } | Content::Unknown { .. } => 0,
        }
    }

    pub fn mentions(&self) -> &[Topic] {
        match self {
            Content::Pdf { extracted_data, .. } => &extracted_data.mentions,
            _ => &[],
        }
    }
}

/// Either the extracted content or the reason extraction failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Parsed { content: Content },
    Failed { error: String },
}

/// Structured outcome of attempting to extract one uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResult {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub category: Category,
    pub outcome: Outcome,
}

impl FileResult {
    pub fn is_parsed(&self) -> bool {
        matches!(self.outcome, Outcome::Parsed { .. })
    }

    pub fn content(&self) -> Option<&Content> {
        match &self.outcome {
            Outcome::Parsed { content } => Some(content),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Parsed { .. } => None,
            Outcome::Failed { error } => Some(error),
        }
    }
}

/// Per-category file results, in category order.
pub type DocumentSet = BTreeMap<Category, Vec<FileResult>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub file_count: usize,
    pub parsed_successfully: usize,
}

/// Fold of a [`DocumentSet`]; see [`aggregate_insights`](crate::insights::aggregate_insights).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsSummary {
    pub total_files: usize,
    pub categories: BTreeMap<Category, CategoryStats>,
    pub mentions: Vec<Topic>,
    pub extracted_fields: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskRating {
    Low,
    Medium,
    High,
}

impl RiskRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskRating::Low => "low",
            RiskRating::Medium => "medium",
            RiskRating::High => "high",
        }
    }
}

impl fmt::Display for RiskRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Livestock {
    pub species: String,
    pub count: u64,
    pub value: f64,
}

/// Everything a profile carries except the identity the store assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePayload {
    pub farmer_name: String,
    pub livestock: Livestock,
    pub data_points: usize,
    pub modules: Vec<String>,
    pub risk_rating: RiskRating,
    pub valuation: f64,
    pub confidence: f64,
    pub use_case: String,
    pub documents: DocumentSet,
    pub insights: InsightsSummary,
    pub form_data: FormData,
}

/// The persisted record of one completed intake session.
///
/// Created once by [`ProfileStore::create`](crate::store::ProfileStore::create)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub farmer_name: String,
    pub livestock: Livestock,
    pub data_points: usize,
    pub modules: Vec<String>,
    pub risk_rating: RiskRating,
    pub valuation: f64,
    pub confidence: f64,
    pub use_case: String,
    pub documents: DocumentSet,
    pub insights: InsightsSummary,
    pub form_data: FormData,
}

impl Profile {
    pub fn from_payload(id: String, created_at: DateTime<Utc>, payload: ProfilePayload) -> Self {
        Self {
            id,
            created_at,
            farmer_name: payload.farmer_name,
            livestock: payload.livestock,
            data_points: payload.data_points,
            modules: payload.modules,
            risk_rating: payload.risk_rating,
            valuation: payload.valuation,
            confidence: payload.confidence,
            use_case: payload.use_case,
            documents: payload.documents,
            insights: payload.insights,
            form_data: payload.form_data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_aliases() {
        assert_eq!("BANK".parse::<Category>().unwrap(), Category::Bank);
        assert_eq!("identity".parse::<Category>().unwrap(), Category::Id);
        assert!("tax".parse::<Category>().is_err());
    }

    #[test]
    fn content_serializes_with_kind_tag() {
        let content = Content::Image {
            note: "OCR not performed".to_string(),
        };
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["note"], "OCR not performed");
    }

    #[test]
    fn failed_result_has_error_and_no_content() {
        let result = FileResult {
            name: "broken.pdf".to_string(),
            size: 9,
            mime_type: "application/pdf".to_string(),
            category: Category::Bank,
            outcome: Outcome::Failed {
                error: "bad xref".to_string(),
            },
        };
        assert!(!result.is_parsed());
        assert!(result.content().is_none());
        assert_eq!(result.error(), Some("bad xref"));

        let json = serde_json::to_string(&result).unwrap();
        let back: FileResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
