//! Per-format text extraction.
//!
//! Each supported file kind converts a file on disk into zero or more
//! [`SourceRecord`]s. Binary containers (PDF, DOCX) go through the same
//! stack as everything else here: `pdf-extract` for PDF, `zip` +
//! `quick-xml` for OOXML. Extraction is file-scoped: an [`ExtractError`]
//! names the offending file and is isolated by the orchestrator, never
//! aborting the whole run.

use std::io::Read;
use std::path::Path;

use crate::models::SourceRecord;

/// Closed set of supported input kinds, with a total mapping from file
/// extension. Anything else is `Unsupported` and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Line-delimited JSON records (the fixed-name file only).
    Records,
    Pdf,
    Docx,
    Text,
    Csv,
    Json,
    Unsupported,
}

impl FileKind {
    /// Map a path's extension (case-insensitive) to a kind. The fixed-name
    /// records file is dispatched separately by the orchestrator and never
    /// goes through this mapping.
    pub fn from_path(path: &Path) -> FileKind {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => FileKind::Pdf,
            "docx" => FileKind::Docx,
            "txt" => FileKind::Text,
            "csv" => FileKind::Csv,
            "json" => FileKind::Json,
            _ => FileKind::Unsupported,
        }
    }
}

/// Extraction failure for a single file. Always carries the path so the
/// orchestrator can report which file was skipped.
#[derive(Debug)]
pub enum ExtractError {
    Io { path: String, error: String },
    Pdf { path: String, error: String },
    Docx { path: String, error: String },
    Csv { path: String, error: String },
    Json { path: String, error: String },
    /// A malformed line aborts the whole records file: line-delimited
    /// sources are expected to be well-formed, and partial ingestion of a
    /// corrupt source is worse than a loud failure.
    Records {
        path: String,
        line: usize,
        error: String,
    },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Io { path, error } => write!(f, "{}: read failed: {}", path, error),
            ExtractError::Pdf { path, error } => {
                write!(f, "{}: PDF extraction failed: {}", path, error)
            }
            ExtractError::Docx { path, error } => {
                write!(f, "{}: DOCX extraction failed: {}", path, error)
            }
            ExtractError::Csv { path, error } => {
                write!(f, "{}: CSV extraction failed: {}", path, error)
            }
            ExtractError::Json { path, error } => {
                write!(f, "{}: JSON extraction failed: {}", path, error)
            }
            ExtractError::Records { path, line, error } => {
                write!(f, "{}: malformed record on line {}: {}", path, line, error)
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extractor output: the records plus a count of elements that were
/// deliberately dropped (JSON elements without a `raw_text` field). The
/// orchestrator surfaces drops as skip events rather than losing them
/// silently.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<SourceRecord>,
    pub dropped: usize,
}

impl Extraction {
    fn single(record: SourceRecord) -> Extraction {
        Extraction {
            records: vec![record],
            dropped: 0,
        }
    }
}

/// Extract records from one file according to its kind.
///
/// The orchestrator dispatches the fixed-name records file and skips
/// `Unsupported` entries before calling this; both variants are still
/// handled so the mapping stays total.
pub fn extract_file(path: &Path, kind: FileKind) -> Result<Extraction, ExtractError> {
    match kind {
        FileKind::Pdf => extract_pdf(path),
        FileKind::Docx => extract_docx(path),
        FileKind::Text => extract_text_file(path),
        FileKind::Csv => extract_csv(path),
        FileKind::Json => extract_json_array(path),
        FileKind::Records => extract_records(path),
        FileKind::Unsupported => Ok(Extraction::default()),
    }
}

fn record_for_file(path: &Path, raw_text: String) -> SourceRecord {
    SourceRecord {
        identifier: path.display().to_string(),
        title: file_stem(path),
        raw_text,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn io_err(path: &Path, e: impl std::fmt::Display) -> ExtractError {
    ExtractError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    }
}

// ============ PDF ============

/// All pages concatenated in document order. Pages without extractable
/// text (scanned or image-only) contribute nothing; that is not an error.
fn extract_pdf(path: &Path) -> Result<Extraction, ExtractError> {
    let text = pdf_extract::extract_text(path).map_err(|e| ExtractError::Pdf {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;
    Ok(Extraction::single(record_for_file(
        path,
        text.trim().to_string(),
    )))
}

// ============ DOCX ============

/// Maximum decompressed bytes read from `word/document.xml` (zip-bomb
/// protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Paragraph texts in document order, newline-separated: `<w:t>` runs are
/// concatenated and every closed `<w:p>` emits a newline.
fn extract_docx(path: &Path) -> Result<Extraction, ExtractError> {
    let docx_err = |e: String| ExtractError::Docx {
        path: path.display().to_string(),
        error: e,
    };
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| docx_err(e.to_string()))?;

    let mut doc_xml = Vec::new();
    {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|_| docx_err("word/document.xml not found".to_string()))?;
        entry
            .take(MAX_XML_ENTRY_BYTES)
            .read_to_end(&mut doc_xml)
            .map_err(|e| docx_err(e.to_string()))?;
        if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
            return Err(docx_err("word/document.xml exceeds size limit".to_string()));
        }
    }

    let text = paragraphs_from_document_xml(&doc_xml).map_err(docx_err)?;
    Ok(Extraction::single(record_for_file(
        path,
        text.trim().to_string(),
    )))
}

fn paragraphs_from_document_xml(xml: &[u8]) -> Result<String, String> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"p" {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(e.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

// ============ Plain text ============

fn extract_text_file(path: &Path) -> Result<Extraction, ExtractError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(Extraction::single(record_for_file(
        path,
        text.trim().to_string(),
    )))
}

// ============ CSV ============

/// Every row's cells joined with `" | "`, rows newline-separated. The
/// header row is kept as ordinary text; column names carry no semantics
/// here.
fn extract_csv(path: &Path) -> Result<Extraction, ExtractError> {
    let csv_err = |e: String| ExtractError::Csv {
        path: path.display().to_string(),
        error: e,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| csv_err(e.to_string()))?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_err(e.to_string()))?;
        rows.push(record.iter().collect::<Vec<_>>().join(" | "));
    }
    Ok(Extraction::single(record_for_file(
        path,
        rows.join("\n").trim().to_string(),
    )))
}

// ============ JSON array ============

/// The file must be a single JSON array. Elements that already carry a
/// string `raw_text` field pass through as pre-formed records; elements
/// without one are counted as dropped.
fn extract_json_array(path: &Path) -> Result<Extraction, ExtractError> {
    let json_err = |e: String| ExtractError::Json {
        path: path.display().to_string(),
        error: e,
    };
    let content = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| json_err(e.to_string()))?;

    let items = value
        .as_array()
        .ok_or_else(|| json_err("expected a top-level JSON array".to_string()))?;

    let mut out = Extraction::default();
    for item in items {
        match record_from_value(item, path) {
            Some(record) => out.records.push(record),
            None => out.dropped += 1,
        }
    }
    Ok(out)
}

/// Pre-formed record shape accepted from JSON sources: `raw_text` is
/// required, `url` and `title` fall back to the originating file.
fn record_from_value(value: &serde_json::Value, path: &Path) -> Option<SourceRecord> {
    let raw_text = value.get("raw_text")?.as_str()?.to_string();
    let identifier = value
        .get("url")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.display().to_string());
    let title = value
        .get("title")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| file_stem(path));
    Some(SourceRecord {
        identifier,
        title,
        raw_text,
    })
}

// ============ Line-delimited records ============

/// One JSON object per line; blank lines skipped. A malformed line aborts
/// the whole file. Objects without `raw_text` count as dropped so the run
/// summary can surface them.
pub fn extract_records(path: &Path) -> Result<Extraction, ExtractError> {
    let content = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;

    let mut out = Extraction::default();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: serde_json::Value =
            serde_json::from_str(line).map_err(|e| ExtractError::Records {
                path: path.display().to_string(),
                line: idx + 1,
                error: e.to_string(),
            })?;
        match record_from_value(&value, path) {
            Some(record) => out.records.push(record),
            None => out.dropped += 1,
        }
    }
    Ok(out)
}
