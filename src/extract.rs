//! Format-specific extraction for uploaded documents (PDF, CSV, spreadsheets).
//!
//! Each function takes raw bytes and returns a typed [`Content`] or an
//! [`ExtractError`]. None of them panic on malformed input; the pipeline turns
//! errors into failed file results and moves on to the next file.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use herd_intake_core::digest::{excerpt, extract_data, ColumnSums};
use herd_intake_core::models::{Content, CsvRow};

use crate::config::IngestConfig;

/// Maximum cells to read from a worksheet, padding for sparse columns included.
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;
/// Columns in an OOXML worksheet, `A` through `XFD`.
const XLSX_MAX_COLUMNS: usize = 16_384;
/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

pub const IMAGE_NOTE: &str = "Image received; OCR not performed";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("failed to read {name}: {reason}")]
    Read { name: String, reason: String },
    #[error("{name} is {size} bytes, over the {limit}-byte limit")]
    TooLarge { name: String, size: u64, limit: u64 },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("CSV extraction failed: {0}")]
    Csv(String),
    #[error("spreadsheet extraction failed: {0}")]
    Spreadsheet(String),
    #[error("extractor task failed: {0}")]
    Task(String),
}

/// Extractor family chosen from the file name's trailing extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Pdf,
    Csv,
    Spreadsheet,
    Image,
    Unknown,
}

impl FileKind {
    pub fn from_name(name: &str) -> Self {
        match extension(name).as_deref() {
            Some("pdf") => FileKind::Pdf,
            Some("csv") => FileKind::Csv,
            Some("xlsx") | Some("xls") => FileKind::Spreadsheet,
            Some("jpg") | Some("jpeg") | Some("png") => FileKind::Image,
            _ => FileKind::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Csv => "csv",
            FileKind::Spreadsheet => "spreadsheet",
            FileKind::Image => "image",
            FileKind::Unknown => "unknown",
        }
    }
}

/// Lowercased text after the last dot, if the name has one.
pub fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Output limits applied by the extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractLimits {
    pub excerpt_chars: usize,
    pub preview_rows: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            excerpt_chars: 1000,
            preview_rows: 10,
        }
    }
}

impl From<&IngestConfig> for ExtractLimits {
    fn from(config: &IngestConfig) -> Self {
        Self {
            excerpt_chars: config.excerpt_chars,
            preview_rows: config.preview_rows,
        }
    }
}

// ── PDF ─────────────────────────────────────────────────────────────────

pub fn extract_pdf(bytes: &[u8], limits: ExtractLimits) -> Result<Content, ExtractError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(pdf_content(&pages, limits.excerpt_chars))
}

/// Builds PDF content from per-page text in page order.
///
/// The stored text is an excerpt; dates and topics come from the full text.
pub fn pdf_content(pages: &[String], excerpt_chars: usize) -> Content {
    let full = pages.join("\n");
    Content::Pdf {
        pages: pages.len(),
        text: excerpt(&full, excerpt_chars),
        extracted_data: extract_data(&full),
    }
}

// ── CSV ─────────────────────────────────────────────────────────────────

/// Parses CSV with a header row. Rows whose cells are all blank are skipped.
pub fn extract_csv(bytes: &[u8], limits: ExtractLimits) -> Result<Content, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ExtractError::Csv(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = 0usize;
    let mut preview: Vec<CsvRow> = Vec::new();
    let mut sums = ColumnSums::new();

    for record in reader.records() {
        let record = record.map_err(|e| ExtractError::Csv(e.to_string()))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows += 1;

        for (i, header) in headers.iter().enumerate() {
            sums.add(header, record.get(i).unwrap_or(""));
        }

        if preview.len() < limits.preview_rows {
            preview.push(
                headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| (h.clone(), record.get(i).unwrap_or("").to_string()))
                    .collect(),
            );
        }
    }

    Ok(Content::Csv {
        rows,
        summary: sums.finish(&headers),
        headers,
        preview,
    })
}

// ── Spreadsheets ────────────────────────────────────────────────────────

/// First worksheet of a workbook as a grid of cell text.
#[derive(Debug, Default)]
struct FirstSheet {
    sheets: usize,
    name: String,
    rows: Vec<Vec<String>>,
}

/// Reads the first sheet of an `.xlsx` or `.xls` workbook.
///
/// The first non-blank row is the header; every following non-blank row is
/// data. OOXML workbooks are detected by their ZIP signature, anything else
/// is handed to the legacy BIFF reader.
pub fn extract_spreadsheet(bytes: &[u8], limits: ExtractLimits) -> Result<Content, ExtractError> {
    let sheet = if bytes.starts_with(ZIP_MAGIC) {
        read_ooxml_first_sheet(bytes)?
    } else {
        read_legacy_first_sheet(bytes)?
    };
    Ok(sheet_content(sheet, limits))
}

fn sheet_content(sheet: FirstSheet, limits: ExtractLimits) -> Content {
    let mut rows = sheet
        .rows
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()));

    let headers: Vec<String> = rows
        .next()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("Column {}", i + 1)
            } else {
                h.to_string()
            }
        })
        .collect();
    let data: Vec<Vec<String>> = rows.collect();

    let mut sums = ColumnSums::new();
    for row in &data {
        for (i, header) in headers.iter().enumerate() {
            sums.add(header, row.get(i).map(String::as_str).unwrap_or(""));
        }
    }

    Content::Excel {
        sheets: sheet.sheets,
        sheet_name: sheet.name,
        rows: data.len(),
        preview: data.iter().take(limits.preview_rows).cloned().collect(),
        summary: sums.finish(&headers),
        headers,
    }
}

fn read_legacy_first_sheet(bytes: &[u8]) -> Result<FirstSheet, ExtractError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;
    let names = workbook.sheet_names();
    let name = names
        .first()
        .cloned()
        .ok_or_else(|| ExtractError::Spreadsheet("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(FirstSheet {
        sheets: names.len(),
        name,
        rows,
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{:.0}", f),
        other => other.to_string(),
    }
}

fn read_ooxml_first_sheet(bytes: &[u8]) -> Result<FirstSheet, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;

    let shared_strings = if has_entry(&archive, SHARED_STRINGS_PART) {
        read_shared_strings(&mut archive)?
    } else {
        Vec::new()
    };

    let entries = if has_entry(&archive, WORKBOOK_PART) {
        let xml = read_zip_entry_bounded(&mut archive, WORKBOOK_PART, MAX_XML_ENTRY_BYTES)?;
        read_sheet_entries(&xml)?
    } else {
        Vec::new()
    };
    let relationships = if has_entry(&archive, WORKBOOK_RELS_PART) {
        let xml = read_zip_entry_bounded(&mut archive, WORKBOOK_RELS_PART, MAX_XML_ENTRY_BYTES)?;
        read_relationships(&xml)?
    } else {
        HashMap::new()
    };

    // The first tab in workbook order, found through its relationship.
    // Packages without a usable relationship fall back to the lowest-numbered part.
    let worksheets = list_worksheet_names(&archive);
    let linked = entries
        .first()
        .and_then(|entry| entry.rel_id.as_ref())
        .and_then(|id| relationships.get(id))
        .map(|target| part_path(target))
        .filter(|path| has_entry(&archive, path));
    let part = linked
        .or_else(|| worksheets.first().cloned())
        .ok_or_else(|| ExtractError::Spreadsheet("workbook has no worksheets".to_string()))?;

    let sheet_xml = read_zip_entry_bounded(&mut archive, &part, MAX_XML_ENTRY_BYTES)?;
    let rows = read_sheet_rows(&sheet_xml, &shared_strings)?;

    Ok(FirstSheet {
        sheets: worksheets.len().max(entries.len()),
        name: entries
            .into_iter()
            .next()
            .map(|entry| entry.name)
            .unwrap_or_else(|| "Sheet1".to_string()),
        rows,
    })
}

fn has_entry(archive: &zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> bool {
    archive.file_names().any(|n| n == name)
}

/// Archive path of a relationship target declared in `xl/_rels/workbook.xml.rels`.
fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target.trim_start_matches("./")),
    }
}

fn read_zip_entry_bounded(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Spreadsheet(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn list_worksheet_names(archive: &zip::ZipArchive<Cursor<&[u8]>>) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

/// A `<sheet>` element of `xl/workbook.xml`.
#[derive(Debug, PartialEq)]
struct SheetEntry {
    name: String,
    rel_id: Option<String>,
}

/// Sheets listed in `xl/workbook.xml`, in tab order.
fn read_sheet_entries(xml: &[u8]) -> Result<Vec<SheetEntry>, ExtractError> {
    let mut entries = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e))
                if e.local_name().as_ref() == b"sheet" =>
            {
                if let Some(name) = attr_value(&e, b"name") {
                    // `r:id`; `sheetId` has a different local name.
                    let rel_id = attr_value(&e, b"id");
                    entries.push(SheetEntry { name, rel_id });
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Spreadsheet(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(entries)
}

/// Relationship `Id` to `Target` from a `.rels` part.
fn read_relationships(xml: &[u8]) -> Result<HashMap<String, String>, ExtractError> {
    let mut targets = HashMap::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) | Ok(quick_xml::events::Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                if let (Some(id), Some(target)) =
                    (attr_value(&e, b"Id"), attr_value(&e, b"Target"))
                {
                    targets.insert(id, target);
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Spreadsheet(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

/// Shared string table; rich-text runs inside one `<si>` are concatenated.
fn read_shared_strings(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
) -> Result<Vec<String>, ExtractError> {
    let xml = read_zip_entry_bounded(archive, SHARED_STRINGS_PART, MAX_XML_ENTRY_BYTES)?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_t = current.is_some(),
                _ => {}
            },
            Ok(quick_xml::events::Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(quick_xml::events::Event::Text(te)) if in_t => {
                if let Some(s) = current.as_mut() {
                    s.push_str(te.unescape().unwrap_or_default().as_ref());
                }
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"si" => {
                    if let Some(s) = current.take() {
                        strings.push(s);
                    }
                }
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Spreadsheet(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Shared,
    Inline,
    Boolean,
    Other,
}

/// Rows of a worksheet as cell text, with sparse columns padded by `""`.
///
/// Fails on references past column `XFD` and on sheets over
/// `XLSX_MAX_CELLS_PER_SHEET` cells once padding is counted.
fn read_sheet_rows(xml: &[u8], shared_strings: &[String]) -> Result<Vec<Vec<String>>, ExtractError> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut row: Vec<String> = Vec::new();
    let mut col = 0usize;
    let mut cell_type = CellType::Other;
    let mut value = String::new();
    let mut in_value = false;
    let mut cell_count = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => match e.local_name().as_ref() {
                b"row" => row = Vec::new(),
                b"c" => {
                    col = match attr_value(&e, b"r") {
                        Some(reference) => column_index(&reference)?.unwrap_or(row.len()),
                        None => row.len(),
                    };
                    cell_type = match attr_value(&e, b"t").as_deref() {
                        Some("s") => CellType::Shared,
                        Some("inlineStr") => CellType::Inline,
                        Some("b") => CellType::Boolean,
                        _ => CellType::Other,
                    };
                    value.clear();
                }
                b"v" => in_value = true,
                b"t" if cell_type == CellType::Inline => in_value = true,
                _ => {}
            },
            Ok(quick_xml::events::Event::Empty(e)) if e.local_name().as_ref() == b"row" => {
                rows.push(Vec::new());
            }
            Ok(quick_xml::events::Event::Text(te)) if in_value => {
                value.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    let text = match cell_type {
                        CellType::Shared => value
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|i| shared_strings.get(i).cloned())
                            .unwrap_or_default(),
                        CellType::Boolean => match value.trim() {
                            "1" => "TRUE".to_string(),
                            "0" => "FALSE".to_string(),
                            other => other.to_string(),
                        },
                        CellType::Inline | CellType::Other => value.clone(),
                    };
                    cell_count += (col + 1).saturating_sub(row.len()).max(1);
                    if cell_count > XLSX_MAX_CELLS_PER_SHEET {
                        return Err(ExtractError::Spreadsheet(format!(
                            "worksheet exceeds {} cells",
                            XLSX_MAX_CELLS_PER_SHEET
                        )));
                    }
                    if row.len() <= col {
                        row.resize(col + 1, String::new());
                    }
                    row[col] = text;
                }
                b"row" => rows.push(std::mem::take(&mut row)),
                _ => {}
            },
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Spreadsheet(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn attr_value(e: &quick_xml::events::BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

/// Zero-based column index of a cell reference such as `AB12`.
///
/// `Ok(None)` when the reference has no column letters.
fn column_index(reference: &str) -> Result<Option<usize>, ExtractError> {
    let mut n = 0usize;
    for b in reference.bytes().take_while(u8::is_ascii_alphabetic) {
        let digit = (b.to_ascii_uppercase() - b'A' + 1) as usize;
        n = n
            .checked_mul(26)
            .and_then(|n| n.checked_add(digit))
            .filter(|n| *n <= XLSX_MAX_COLUMNS)
            .ok_or_else(|| {
                ExtractError::Spreadsheet(format!(
                    "cell reference {} is past column XFD",
                    reference
                ))
            })?;
    }
    Ok(n.checked_sub(1))
}
