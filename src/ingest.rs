//! Document ingestion pipeline.
//!
//! Walks a batch of uploaded files one at a time, dispatches each to the
//! extractor registered for its [`FileKind`], and records a [`FileResult`]
//! per file in input order. A failing file (unreadable, too large, malformed)
//! becomes a failed result; it never stops the rest of the batch.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, warn};

use herd_intake_core::models::{Category, Content, FileResult, Outcome};

use crate::config::{Config, IngestConfig};
use crate::extract::{ExtractError, ExtractLimits, FileKind};
use crate::traits::{ExtractorRegistry, UnknownPlaceholder};

/// Where an upload's bytes come from.
#[derive(Debug, Clone)]
pub enum FileBody {
    Bytes(Vec<u8>),
    /// Read lazily by the pipeline; a read failure fails only this file.
    Path(PathBuf),
}

/// A file handed over by the caller for one category.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub category: Category,
    pub body: FileBody,
}

impl UploadedFile {
    pub fn from_bytes(name: impl Into<String>, category: Category, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            mime_type: guess_mime(&name),
            size: bytes.len() as u64,
            name,
            category,
            body: FileBody::Bytes(bytes),
        }
    }

    /// Describes a file on disk without reading it. A missing file gets size 0.
    pub fn from_path(path: impl AsRef<Path>, category: Category) -> Self {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        Self {
            mime_type: guess_mime(&name),
            size,
            name,
            category,
            body: FileBody::Path(path.to_path_buf()),
        }
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_name(&self.name)
    }
}

fn guess_mime(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Sequential, single-attempt extraction over a registry of extractors.
pub struct Pipeline {
    registry: ExtractorRegistry,
    max_file_bytes: u64,
}

impl Pipeline {
    pub fn new(registry: ExtractorRegistry, max_file_bytes: u64) -> Self {
        Self {
            registry,
            max_file_bytes,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            ExtractorRegistry::with_builtins(ExtractLimits::from(config)),
            config.max_file_bytes,
        )
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ExtractorRegistry {
        &mut self.registry
    }

    /// Extracts every file in order and returns one result per input file.
    ///
    /// Results carry `category` regardless of the tag on the upload itself.
    pub async fn ingest(&self, files: &[UploadedFile], category: Category) -> Vec<FileResult> {
        let mut results = Vec::with_capacity(files.len());

        for file in files {
            let outcome = match self.extract_one(file).await {
                Ok(content) => Outcome::Parsed { content },
                Err(e) => {
                    warn!(file = %file.name, category = %category, error = %e, "extraction failed");
                    Outcome::Failed {
                        error: e.to_string(),
                    }
                }
            };

            results.push(FileResult {
                name: file.name.clone(),
                size: file.size,
                mime_type: file.mime_type.clone(),
                category,
                outcome,
            });
        }

        results
    }

    async fn extract_one(&self, file: &UploadedFile) -> Result<Content, ExtractError> {
        let kind = file.kind();
        let Some(extractor) = self.registry.resolve(kind) else {
            return Ok(UnknownPlaceholder::content_for(&file.name));
        };
        debug!(file = %file.name, kind = kind.as_str(), extractor = extractor.name(), "dispatching");

        let bytes = if extractor.needs_bytes() {
            self.read_bytes(file).await?
        } else {
            Vec::new()
        };
        extractor.extract(file, bytes).await
    }

    async fn read_bytes(&self, file: &UploadedFile) -> Result<Vec<u8>, ExtractError> {
        self.check_size(file, file.size)?;
        let bytes = match &file.body {
            FileBody::Bytes(bytes) => bytes.clone(),
            FileBody::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|e| ExtractError::Read {
                        name: file.name.clone(),
                        reason: e.to_string(),
                    })?
            }
        };
        self.check_size(file, bytes.len() as u64)?;
        Ok(bytes)
    }

    fn check_size(&self, file: &UploadedFile, size: u64) -> Result<(), ExtractError> {
        if size > self.max_file_bytes {
            return Err(ExtractError::TooLarge {
                name: file.name.clone(),
                size,
                limit: self.max_file_bytes,
            });
        }
        Ok(())
    }
}

/// CLI entry point: ingests `paths` under `category` and prints the results as JSON.
///
/// Nothing is persisted.
pub async fn run_ingest(config: &Config, category: Category, paths: &[PathBuf]) -> Result<()> {
    let pipeline = Pipeline::from_config(&config.ingest);
    let files: Vec<UploadedFile> = paths
        .iter()
        .map(|p| UploadedFile::from_path(p, category))
        .collect();

    let results = pipeline.ingest(&files, category).await;
    let parsed = results.iter().filter(|r| r.is_parsed()).count();

    println!("{}", serde_json::to_string_pretty(&results)?);
    eprintln!(
        "ingest {}: {} files, {} parsed, {} failed",
        category,
        results.len(),
        parsed,
        results.len() - parsed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> Pipeline {
        Pipeline::from_config(&IngestConfig::default())
    }

    #[tokio::test]
    async fn preserves_order_and_isolates_failures() {
        let files = vec![
            UploadedFile::from_bytes("broken.pdf", Category::Bank, b"not a pdf".to_vec()),
            UploadedFile::from_bytes("ledger.csv", Category::Bank, b"amount\n10\n5\n".to_vec()),
            UploadedFile::from_bytes("cow.PNG", Category::Bank, vec![0x89, 0x50]),
            UploadedFile::from_bytes("notes.docx", Category::Bank, b"zzz".to_vec()),
        ];

        let results = pipeline().ingest(&files, Category::Bank).await;

        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["broken.pdf", "ledger.csv", "cow.PNG", "notes.docx"]);

        assert!(!results[0].is_parsed());
        assert_eq!(results[1].content().map(|c| c.kind()), Some("csv"));
        assert_eq!(results[2].content().map(|c| c.kind()), Some("image"));
        assert_eq!(results[3].content().map(|c| c.kind()), Some("unknown"));

        for r in &results {
            assert_eq!(r.category, Category::Bank);
            assert!(r.content().is_some() != r.error().is_some());
        }
    }

    #[tokio::test]
    async fn unreadable_path_fails_only_that_file() {
        let files = vec![
            UploadedFile::from_path("/nonexistent/statement.csv", Category::Bank),
            UploadedFile::from_bytes("ok.csv", Category::Bank, b"a\n1\n".to_vec()),
        ];
        let results = pipeline().ingest(&files, Category::Bank).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].error().unwrap().contains("failed to read"));
        assert!(results[1].is_parsed());
    }

    #[tokio::test]
    async fn oversized_file_is_rejected_before_parsing() {
        let pipeline = Pipeline::new(ExtractorRegistry::default(), 4);
        let files = vec![UploadedFile::from_bytes(
            "big.csv",
            Category::Herd,
            b"a\n1\n2\n".to_vec(),
        )];
        let results = pipeline.ingest(&files, Category::Herd).await;
        assert!(results[0].error().unwrap().contains("limit"));
    }

    #[tokio::test]
    async fn placeholders_do_not_read_bytes() {
        let files = vec![UploadedFile::from_path("/nonexistent/passport.jpg", Category::Id)];
        let results = pipeline().ingest(&files, Category::Id).await;
        assert!(results[0].is_parsed());
    }

    #[tokio::test]
    async fn empty_batch_yields_no_results() {
        assert!(pipeline().ingest(&[], Category::Health).await.is_empty());
    }

    #[test]
    fn mime_is_guessed_from_name() {
        let f = UploadedFile::from_bytes("a.pdf", Category::Bank, Vec::new());
        assert_eq!(f.mime_type, "application/pdf");
        let g = UploadedFile::from_bytes("blob", Category::Bank, Vec::new());
        assert_eq!(g.mime_type, "application/octet-stream");
    }
}
