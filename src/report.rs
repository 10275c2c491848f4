//! Plain-text intake report.
//!
//! Renders one stored profile as a human-readable report: header, farmer
//! and livestock, assessment, modules, documents per category, the insight
//! digest, and the raw form payload with keys sorted. Pure formatting; the
//! profile is never re-parsed or modified.

use std::fmt;
use std::path::Path;

use anyhow::{bail, Result};

use herd_intake_core::models::{Category, Content, FileResult, Profile};

use crate::config::Config;
use crate::db;

const RULE: &str = "============================================================";

/// Display adapter for a profile's report.
pub struct Report<'a>(pub &'a Profile);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_report(f, self.0)
    }
}

pub fn render_report(profile: &Profile) -> String {
    Report(profile).to_string()
}

fn write_report(out: &mut fmt::Formatter<'_>, p: &Profile) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "LIVESTOCK INTAKE REPORT")?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "Profile ID: {}", p.id)?;
    writeln!(
        out,
        "Generated:  {}",
        p.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)?;

    writeln!(out, "FARMER")?;
    writeln!(out, "  Name:      {}", or_dash(&p.farmer_name))?;
    writeln!(out, "  Use case:  {}", or_dash(&p.use_case))?;
    writeln!(out)?;

    writeln!(out, "LIVESTOCK")?;
    writeln!(out, "  Species:   {}", or_dash(&p.livestock.species))?;
    writeln!(out, "  Head:      {}", p.livestock.count)?;
    writeln!(out, "  Declared:  {:.2}", p.livestock.value)?;
    writeln!(out)?;

    writeln!(out, "ASSESSMENT")?;
    writeln!(out, "  Risk rating: {}", p.risk_rating)?;
    writeln!(out, "  Valuation:   {:.0}", p.valuation)?;
    writeln!(out, "  Confidence:  {:.0}%", p.confidence * 100.0)?;
    writeln!(out, "  Data points: {}", p.data_points)?;
    writeln!(out)?;

    writeln!(out, "MODULES")?;
    if p.modules.is_empty() {
        writeln!(out, "  (none selected)")?;
    }
    for module in &p.modules {
        writeln!(out, "  - {}", module)?;
    }
    writeln!(out)?;

    writeln!(out, "DOCUMENTS")?;
    for category in Category::ALL {
        let files = p.documents.get(&category).map(Vec::as_slice).unwrap_or(&[]);
        writeln!(out, "  {} ({})", category.label(), files.len())?;
        for file in files {
            writeln!(out, "    {}", describe_file(file))?;
        }
    }
    writeln!(out)?;

    writeln!(out, "INSIGHTS")?;
    writeln!(out, "  Total files:      {}", p.insights.total_files)?;
    writeln!(out, "  Extracted fields: {}", p.insights.extracted_fields)?;
    let mentions: Vec<&str> = p.insights.mentions.iter().map(|t| t.as_str()).collect();
    writeln!(
        out,
        "  Mentions:         {}",
        if mentions.is_empty() {
            "-".to_string()
        } else {
            mentions.join(", ")
        }
    )?;
    for (category, stats) in &p.insights.categories {
        writeln!(
            out,
            "  {:<16}  {}/{} parsed",
            category.label(),
            stats.parsed_successfully,
            stats.file_count
        )?;
    }
    writeln!(out)?;

    writeln!(out, "FORM DATA")?;
    if p.form_data.is_empty() {
        writeln!(out, "  (empty)")?;
    }
    for (key, value) in p.form_data.sorted_entries() {
        let shown = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        writeln!(out, "  {}: {}", key, shown)?;
    }
    writeln!(out, "{}", RULE)?;
    Ok(())
}

fn describe_file(file: &FileResult) -> String {
    match (file.content(), file.error()) {
        (Some(content), _) => format!("[parsed] {} ({})", file.name, summarize(content)),
        (None, Some(error)) => format!("[failed] {}: {}", file.name, error),
        (None, None) => format!("[failed] {}", file.name),
    }
}

fn summarize(content: &Content) -> String {
    match content {
        Content::Pdf {
            pages,
            extracted_data,
            ..
        } => format!(
            "pdf, {} pages, {} dates",
            pages,
            extracted_data.dates.len()
        ),
        Content::Csv { rows, headers, .. } => {
            format!("csv, {} rows, {} columns", rows, headers.len())
        }
        Content::Excel {
            sheet_name, rows, ..
        } => format!("excel, sheet '{}', {} rows", sheet_name, rows),
        Content::Image { note } | Content::Unknown { note } => note.clone(),
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() {
        "-"
    } else {
        s
    }
}

/// Render a stored profile as a report.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout.
pub async fn run_report(config: &Config, id: &str, output: Option<&Path>) -> Result<()> {
    let store = db::open_store(config).await?;
    let Some(profile) = store.get(id) else {
        bail!("profile not found: {}", id);
    };

    let report = render_report(profile);
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, &report)?;
            eprintln!("Wrote report for {} to {}", id, path.display());
        }
        None => print!("{}", report),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use herd_intake_core::form::FormData;
    use herd_intake_core::models::{
        CategoryStats, DocumentSet, ExtractedData, InsightsSummary, Livestock, Outcome,
        ProfilePayload, RiskRating, Topic,
    };
    use serde_json::json;

    fn profile() -> Profile {
        let mut documents = DocumentSet::new();
        documents.insert(
            Category::Bank,
            vec![
                FileResult {
                    name: "statement.pdf".into(),
                    size: 2048,
                    mime_type: "application/pdf".into(),
                    category: Category::Bank,
                    outcome: Outcome::Parsed {
                        content: Content::Pdf {
                            pages: 2,
                            text: "Balance 01/02/2024".into(),
                            extracted_data: ExtractedData {
                                dates: vec!["01/02/2024".into()],
                                mentions: vec![Topic::Balance],
                            },
                        },
                    },
                },
                FileResult {
                    name: "broken.xlsx".into(),
                    size: 10,
                    mime_type: "application/octet-stream".into(),
                    category: Category::Bank,
                    outcome: Outcome::Failed {
                        error: "spreadsheet extraction failed: bad zip".into(),
                    },
                },
            ],
        );

        let mut insights = InsightsSummary {
            total_files: 2,
            mentions: vec![Topic::Balance],
            extracted_fields: 2,
            ..InsightsSummary::default()
        };
        insights.categories.insert(
            Category::Bank,
            CategoryStats {
                file_count: 2,
                parsed_successfully: 1,
            },
        );

        let mut form = FormData::new();
        form.insert("species", json!("goats"));
        form.insert("farmerName", json!("Tomás Ruiz"));
        form.insert("livestockCount", json!(30));

        Profile::from_payload(
            "CER-2024-1706000000000-AB12".into(),
            Utc.with_ymd_and_hms(2024, 1, 23, 9, 0, 0).unwrap(),
            ProfilePayload {
                farmer_name: "Tomás Ruiz".into(),
                livestock: Livestock {
                    species: "goats".into(),
                    count: 30,
                    value: 0.0,
                },
                data_points: 5,
                modules: vec![],
                risk_rating: RiskRating::High,
                valuation: 35_100.0,
                confidence: 0.82,
                use_case: String::new(),
                documents,
                insights,
                form_data: form,
            },
        )
    }

    #[test]
    fn report_covers_every_section() {
        let report = render_report(&profile());
        assert!(report.contains("Profile ID: CER-2024-1706000000000-AB12"));
        assert!(report.contains("Generated:  2024-01-23 09:00:00 UTC"));
        assert!(report.contains("Risk rating: high"));
        assert!(report.contains("Confidence:  82%"));
        assert!(report.contains("(none selected)"));
        assert!(report.contains("[parsed] statement.pdf (pdf, 2 pages, 1 dates)"));
        assert!(report.contains("[failed] broken.xlsx: spreadsheet extraction failed"));
        assert!(report.contains("Mentions:         balance"));
        assert!(report.contains("Use case:  -"));
    }

    #[test]
    fn display_adapter_matches_rendered_report() {
        let profile = profile();
        let rendered = render_report(&profile);
        assert_eq!(format!("{}", Report(&profile)), rendered);
        assert!(rendered.starts_with(RULE));
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn form_keys_are_sorted() {
        let report = render_report(&profile());
        let farmer = report.find("  farmerName: Tomás Ruiz").unwrap();
        let count = report.find("  livestockCount: 30").unwrap();
        let species = report.find("  species: goats").unwrap();
        assert!(farmer < count && count < species);
    }

    #[test]
    fn empty_categories_are_listed() {
        let report = render_report(&profile());
        for category in Category::ALL {
            assert!(report.contains(category.label()));
        }
    }
}
