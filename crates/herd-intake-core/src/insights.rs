//! Insight aggregation over ingested documents.
//!
//! A pure fold: no I/O, no identity. Unparsed files count toward the
//! per-category tallies and nothing else.

use crate::models::{DocumentSet, InsightsSummary};

pub fn aggregate_insights(results: &DocumentSet) -> InsightsSummary {
    let mut summary = InsightsSummary::default();

    for (category, files) in results {
        let stats = summary.categories.entry(*category).or_default();
        stats.file_count += files.len();
        summary.total_files += files.len();

        for content in files.iter().filter_map(|f| f.content()) {
            stats.parsed_successfully += 1;
            summary.mentions.extend_from_slice(content.mentions());
            summary.extracted_fields += content.extracted_fields();
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Content, ExtractedData, FileResult, Outcome, Topic};

    fn result(name: &str, category: Category, outcome: Outcome) -> FileResult {
        FileResult {
            name: name.to_string(),
            size: 10,
            mime_type: String::new(),
            category,
            outcome,
        }
    }

    fn pdf(mentions: Vec<Topic>, dates: &[&str]) -> Outcome {
        Outcome::Parsed {
            content: Content::Pdf {
                pages: 1,
                text: String::new(),
                extracted_data: ExtractedData {
                    dates: dates.iter().map(|d| d.to_string()).collect(),
                    mentions,
                },
            },
        }
    }

    #[test]
    fn empty_map_yields_empty_summary() {
        let summary = aggregate_insights(&DocumentSet::new());
        assert_eq!(summary.total_files, 0);
        assert!(summary.mentions.is_empty());
        assert!(summary.categories.is_empty());
        assert_eq!(summary.extracted_fields, 0);
    }

    #[test]
    fn folds_counts_and_flattens_mentions() {
        let mut docs = DocumentSet::new();
        docs.insert(
            Category::Bank,
            vec![
                result("a.pdf", Category::Bank, pdf(vec![Topic::Balance], &["1/2/2024"])),
                result(
                    "b.pdf",
                    Category::Bank,
                    pdf(vec![Topic::Balance, Topic::Expense], &[]),
                ),
                result(
                    "c.pdf",
                    Category::Bank,
                    Outcome::Failed {
                        error: "corrupt".to_string(),
                    },
                ),
            ],
        );
        docs.insert(
            Category::Id,
            vec![result(
                "passport.png",
                Category::Id,
                Outcome::Parsed {
                    content: Content::Image {
                        note: "OCR not performed".to_string(),
                    },
                },
            )],
        );

        let summary = aggregate_insights(&docs);
        assert_eq!(summary.total_files, 4);
        assert_eq!(summary.categories[&Category::Bank].file_count, 3);
        assert_eq!(summary.categories[&Category::Bank].parsed_successfully, 2);
        assert_eq!(summary.categories[&Category::Id].parsed_successfully, 1);
        assert_eq!(
            summary.mentions,
            vec![Topic::Balance, Topic::Balance, Topic::Expense]
        );
        assert_eq!(summary.extracted_fields, 4);
    }

    #[test]
    fn category_with_no_files_is_still_tallied() {
        let mut docs = DocumentSet::new();
        docs.insert(Category::Health, Vec::new());
        let summary = aggregate_insights(&docs);
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.categories[&Category::Health].file_count, 0);
    }
}
