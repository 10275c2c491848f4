//! Extension traits for document extractors.
//!
//! Every file kind the pipeline understands is handled by an [`Extractor`]
//! registered in an [`ExtractorRegistry`]. Built-ins cover PDF, CSV,
//! spreadsheets, images, and the unknown fallback; registering another
//! extractor for a kind replaces the built-in.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               ExtractorRegistry              │
//! │  ┌─────┐ ┌─────┐ ┌───────┐ ┌─────┐ ┌───────┐ │
//! │  │ PDF │ │ CSV │ │ Sheet │ │Image│ │Unknown│ │
//! │  └─────┘ └─────┘ └───────┘ └─────┘ └───────┘ │
//! └──────────────────────┬───────────────────────┘
//!                        ▼
//!            Pipeline::ingest() → FileResult
//! ```
//!
//! # Usage
//!
//! ```rust
//! use herd_intake::extract::ExtractLimits;
//! use herd_intake::traits::ExtractorRegistry;
//!
//! let mut extractors = ExtractorRegistry::with_builtins(ExtractLimits::default());
//! // extractors.register(Box::new(MyOcrExtractor::new()));
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use herd_intake_core::models::Content;

use crate::extract::{
    extract_csv, extract_pdf, extract_spreadsheet, ExtractError, ExtractLimits, FileKind,
    IMAGE_NOTE,
};
use crate::ingest::UploadedFile;

// ═══════════════════════════════════════════════════════════════════════
// Extractor Trait
// ═══════════════════════════════════════════════════════════════════════

/// Turns the bytes of one uploaded file into typed [`Content`].
///
/// Extractors run one file at a time and are called from the tokio runtime.
/// CPU-heavy parsing should be moved off the async thread (the built-ins use
/// `spawn_blocking`), which also turns a parser panic into an error.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use herd_intake::extract::{ExtractError, FileKind};
/// use herd_intake::ingest::UploadedFile;
/// use herd_intake::models::Content;
/// use herd_intake::traits::Extractor;
///
/// pub struct OcrExtractor;
///
/// #[async_trait]
/// impl Extractor for OcrExtractor {
///     fn name(&self) -> &str { "ocr" }
///     fn kind(&self) -> FileKind { FileKind::Image }
///
///     async fn extract(&self, file: &UploadedFile, _bytes: Vec<u8>) -> Result<Content, ExtractError> {
///         Ok(Content::Image { note: format!("{} recognised", file.name) })
///     }
/// }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// The file kind this extractor handles.
    fn kind(&self) -> FileKind;

    /// Whether the pipeline must load the file's bytes before calling
    /// [`extract`](Extractor::extract). Placeholders return `false` and
    /// receive an empty buffer.
    fn needs_bytes(&self) -> bool {
        true
    }

    async fn extract(&self, file: &UploadedFile, bytes: Vec<u8>) -> Result<Content, ExtractError>;
}

async fn run_blocking<F>(f: F) -> Result<Content, ExtractError>
where
    F: FnOnce() -> Result<Content, ExtractError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractError::Task(e.to_string()))?
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Extractors
// ═══════════════════════════════════════════════════════════════════════

/// Concatenates page text, keeps an excerpt, and digests the full text.
pub struct PdfExtractor {
    limits: ExtractLimits,
}

impl PdfExtractor {
    pub fn new(limits: ExtractLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl Extractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn kind(&self) -> FileKind {
        FileKind::Pdf
    }

    async fn extract(&self, _file: &UploadedFile, bytes: Vec<u8>) -> Result<Content, ExtractError> {
        let limits = self.limits;
        run_blocking(move || extract_pdf(&bytes, limits)).await
    }
}

pub struct CsvExtractor {
    limits: ExtractLimits,
}

impl CsvExtractor {
    pub fn new(limits: ExtractLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl Extractor for CsvExtractor {
    fn name(&self) -> &str {
        "csv"
    }

    fn kind(&self) -> FileKind {
        FileKind::Csv
    }

    async fn extract(&self, _file: &UploadedFile, bytes: Vec<u8>) -> Result<Content, ExtractError> {
        let limits = self.limits;
        run_blocking(move || extract_csv(&bytes, limits)).await
    }
}

/// First-sheet reader for `.xlsx` and `.xls` workbooks.
pub struct SpreadsheetExtractor {
    limits: ExtractLimits,
}

impl SpreadsheetExtractor {
    pub fn new(limits: ExtractLimits) -> Self {
        Self { limits }
    }
}

#[async_trait]
impl Extractor for SpreadsheetExtractor {
    fn name(&self) -> &str {
        "spreadsheet"
    }

    fn kind(&self) -> FileKind {
        FileKind::Spreadsheet
    }

    async fn extract(&self, _file: &UploadedFile, bytes: Vec<u8>) -> Result<Content, ExtractError> {
        let limits = self.limits;
        run_blocking(move || extract_spreadsheet(&bytes, limits)).await
    }
}

/// Accepts images without decoding them.
pub struct ImagePlaceholder;

#[async_trait]
impl Extractor for ImagePlaceholder {
    fn name(&self) -> &str {
        "image"
    }

    fn kind(&self) -> FileKind {
        FileKind::Image
    }

    fn needs_bytes(&self) -> bool {
        false
    }

    async fn extract(&self, _file: &UploadedFile, _bytes: Vec<u8>) -> Result<Content, ExtractError> {
        Ok(Content::Image {
            note: IMAGE_NOTE.to_string(),
        })
    }
}

/// Fallback for any extension without a dedicated extractor.
pub struct UnknownPlaceholder;

impl UnknownPlaceholder {
    pub fn content_for(name: &str) -> Content {
        Content::Unknown {
            note: format!("{}: no extractor for this file type", name),
        }
    }
}

#[async_trait]
impl Extractor for UnknownPlaceholder {
    fn name(&self) -> &str {
        "unknown"
    }

    fn kind(&self) -> FileKind {
        FileKind::Unknown
    }

    fn needs_bytes(&self) -> bool {
        false
    }

    async fn extract(&self, file: &UploadedFile, _bytes: Vec<u8>) -> Result<Content, ExtractError> {
        Ok(Self::content_for(&file.name))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Extractors keyed by [`FileKind`], at most one per kind.
pub struct ExtractorRegistry {
    extractors: HashMap<FileKind, Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Create a registry pre-loaded with an extractor for every file kind.
    pub fn with_builtins(limits: ExtractLimits) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PdfExtractor::new(limits)));
        registry.register(Box::new(CsvExtractor::new(limits)));
        registry.register(Box::new(SpreadsheetExtractor::new(limits)));
        registry.register(Box::new(ImagePlaceholder));
        registry.register(Box::new(UnknownPlaceholder));
        registry
    }

    /// Register an extractor, replacing any previous one for the same kind.
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        self.extractors.insert(extractor.kind(), extractor);
    }

    pub fn get(&self, kind: FileKind) -> Option<&dyn Extractor> {
        self.extractors.get(&kind).map(|e| e.as_ref())
    }

    /// The extractor for `kind`, falling back to the one for [`FileKind::Unknown`].
    pub fn resolve(&self, kind: FileKind) -> Option<&dyn Extractor> {
        self.get(kind).or_else(|| self.get(FileKind::Unknown))
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_builtins(ExtractLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubPdf;

    #[async_trait]
    impl Extractor for StubPdf {
        fn name(&self) -> &str {
            "stub"
        }

        fn kind(&self) -> FileKind {
            FileKind::Pdf
        }

        async fn extract(
            &self,
            _file: &UploadedFile,
            _bytes: Vec<u8>,
        ) -> Result<Content, ExtractError> {
            Ok(Content::Unknown {
                note: "stub".to_string(),
            })
        }
    }

    #[test]
    fn builtins_cover_every_kind() {
        let registry = ExtractorRegistry::default();
        assert_eq!(registry.len(), 5);
        for kind in [
            FileKind::Pdf,
            FileKind::Csv,
            FileKind::Spreadsheet,
            FileKind::Image,
            FileKind::Unknown,
        ] {
            assert_eq!(registry.get(kind).map(|e| e.kind()), Some(kind));
        }
    }

    #[test]
    fn register_replaces_builtin() {
        let mut registry = ExtractorRegistry::default();
        registry.register(Box::new(StubPdf));
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.get(FileKind::Pdf).map(|e| e.name()), Some("stub"));
    }

    #[test]
    fn resolve_falls_back_to_unknown() {
        let mut registry = ExtractorRegistry::new();
        assert!(registry.resolve(FileKind::Csv).is_none());
        registry.register(Box::new(UnknownPlaceholder));
        assert_eq!(
            registry.resolve(FileKind::Csv).map(|e| e.kind()),
            Some(FileKind::Unknown)
        );
    }
}
