//! End-to-end ingestion pipeline tests.
//!
//! Drives `run_ingest` over tempdir fixtures with the in-memory store:
//! full-rebuild semantics, per-format extraction, skip isolation, and
//! chunk accounting.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

use docfeed::config::{ChunkingConfig, Config, EmbeddingConfig, SourceConfig, StoreConfig};
use docfeed::ingest::run_ingest;
use docfeed::models::IngestReport;
use docfeed::progress::NoProgress;
use docfeed::store::{MemoryStore, VectorStore};

fn test_config(source_dir: &Path, store_dir: &Path) -> Config {
    Config {
        source: SourceConfig {
            dir: source_dir.to_path_buf(),
            records_file: "data.txt".to_string(),
        },
        store: StoreConfig {
            location: store_dir.to_path_buf(),
            collection: "documents".to_string(),
        },
        chunking: ChunkingConfig {
            max_size: 1000,
            overlap: 200,
        },
        embedding: EmbeddingConfig {
            provider: "ollama".to_string(),
            model: Some("nomic-embed-text".to_string()),
            dims: Some(8),
            url: None,
            max_retries: 0,
            timeout_secs: 5,
        },
    }
}

fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

async fn ingest(config: &Config, store: &MemoryStore) -> IngestReport {
    run_ingest(config, store, &NoProgress, false).await.unwrap()
}

/// Minimal valid PDF containing `phrase`, with correct xref byte offsets
/// so pdf-extract can parse it.
fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET\n", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!("4 0 obj << /Length {} >> stream\n{}endstream endobj\n", stream.len(), stream)
            .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

/// Minimal DOCX (ZIP) with one `word/document.xml` containing `phrase`.
fn minimal_docx(phrase: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        zip.start_file(
            "word/document.xml",
            zip::write::SimpleFileOptions::default(),
        )
        .unwrap();
        let xml = format!(
            "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:body></w:document>",
            phrase
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    buf
}

#[tokio::test]
async fn two_short_files_yield_two_entries() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    write_file(&src, "a.txt", "hello world");
    write_file(&src, "b.csv", "r1c1,r1c2\nr2c1,r2c2\n");

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();
    let report = ingest(&config, &store).await;

    assert_eq!(report.records, 2);
    assert_eq!(report.chunks, 2);
    assert_eq!(store.count().await.unwrap(), 2);

    let entries = store.entries();
    let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
    assert!(texts.contains(&"hello world"));
    assert!(texts.contains(&"r1c1 | r1c2\nr2c1 | r2c2"));
}

#[tokio::test]
async fn rerun_replaces_prior_entries_with_fresh_ids() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    write_file(&src, "a.txt", "hello world");
    write_file(&src, "b.csv", "x,y\n1,2\n");

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();

    ingest(&config, &store).await;
    let first_ids: HashSet<String> = store.entries().iter().map(|e| e.id.clone()).collect();
    assert_eq!(first_ids.len(), 2);

    ingest(&config, &store).await;
    let second_ids: HashSet<String> = store.entries().iter().map(|e| e.id.clone()).collect();

    // Same number of entries both times; a prior run's entries are gone
    // and ids are never reused.
    assert_eq!(store.count().await.unwrap(), 2);
    assert_eq!(store.reset_count(), 2);
    assert!(first_ids.is_disjoint(&second_ids));
}

#[tokio::test]
async fn unsupported_extension_contributes_nothing() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    write_file(&src, "image.png", "not text");
    write_file(&src, "a.txt", "kept");

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();
    let report = ingest(&config, &store).await;

    assert_eq!(report.records, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn empty_record_yields_no_entries() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    write_file(&src, "blank.txt", "   \n\t\n");

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();
    let report = ingest(&config, &store).await;

    assert_eq!(report.records, 0);
    assert_eq!(report.chunks, 0);
    assert_eq!(report.skipped, 1);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn json_array_elements_pass_through_or_drop() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    write_file(
        &src,
        "docs.json",
        r#"[
            {"url": "https://example.com/1", "title": "first", "raw_text": "alpha body"},
            {"url": "https://example.com/2", "title": "second", "raw_text": "beta body"},
            {"title": "no raw_text here"}
        ]"#,
    );

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();
    let report = ingest(&config, &store).await;

    assert_eq!(report.records, 2);
    assert_eq!(report.skipped, 1);

    let entries = store.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].meta.identifier, "https://example.com/1");
    assert_eq!(entries[0].meta.title, "first");
}

#[tokio::test]
async fn records_file_is_ingested_first() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    write_file(
        &src,
        "data.txt",
        "{\"url\": \"rec://1\", \"title\": \"rec one\", \"raw_text\": \"line record body\"}\n",
    );
    write_file(&src, "a.txt", "plain file body");

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();
    let report = ingest(&config, &store).await;

    assert_eq!(report.records, 2);
    let entries = store.entries();
    // Records file first, then directory entries in sorted order.
    assert_eq!(entries[0].meta.identifier, "rec://1");
    assert_eq!(entries[1].text, "plain file body");
}

#[tokio::test]
async fn malformed_records_file_is_isolated() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    write_file(
        &src,
        "data.txt",
        "{\"raw_text\": \"good line\"}\nthis is not json\n",
    );
    write_file(&src, "a.txt", "survives");

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();
    let report = ingest(&config, &store).await;

    // The whole records file aborts, but the rest of the run continues.
    assert_eq!(report.failed, 1);
    assert_eq!(report.records, 1);
    assert_eq!(store.entries()[0].text, "survives");
}

#[tokio::test]
async fn pdf_and_docx_fixtures_extract() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("doc.pdf"), minimal_pdf("pdf fixture phrase")).unwrap();
    fs::write(src.join("memo.docx"), minimal_docx("docx fixture phrase")).unwrap();

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();
    let report = ingest(&config, &store).await;

    assert_eq!(report.records, 2);
    assert_eq!(report.failed, 0);
    let entries = store.entries();
    assert!(entries.iter().any(|e| e.text.contains("pdf fixture phrase")));
    assert!(entries
        .iter()
        .any(|e| e.text.contains("docx fixture phrase")));
}

#[tokio::test]
async fn long_record_produces_multiple_overlapping_chunks() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    let body = (0..60)
        .map(|i| format!("Sentence number {} with some padding text. ", i))
        .collect::<String>();
    write_file(&src, "long.txt", &body);

    let mut config = test_config(&src, &tmp.path().join("index"));
    config.chunking.max_size = 120;
    config.chunking.overlap = 30;

    let store = MemoryStore::new();
    let report = ingest(&config, &store).await;

    assert_eq!(report.records, 1);
    assert!(report.chunks > 1);
    let entries = store.entries();
    assert_eq!(entries.len() as u64, report.chunks);
    for entry in &entries {
        assert!(entry.text.chars().count() <= 120);
        assert_eq!(entry.meta.title, "long");
    }
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    write_file(&src, "a.txt", "hello world");

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();
    let report = run_ingest(&config, &store, &NoProgress, true).await.unwrap();

    assert_eq!(report.records, 1);
    assert_eq!(report.chunks, 1);
    assert_eq!(store.count().await.unwrap(), 0);
    assert_eq!(store.reset_count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_source_dir_surfaces_as_failure() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    let src = tmp.path().join("data");
    fs::create_dir_all(&src).unwrap();
    write_file(&src, "a.txt", "hello world");

    let mut perms = fs::metadata(&src).unwrap().permissions();
    perms.set_mode(0o000);
    fs::set_permissions(&src, perms).unwrap();

    let restore = |path: &Path| {
        let mut perms = fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).unwrap();
    };

    // Directory permissions do not apply to root; nothing to observe then.
    if fs::read_dir(&src).is_ok() {
        restore(&src);
        return;
    }

    let config = test_config(&src, &tmp.path().join("index"));
    let store = MemoryStore::new();
    let report = run_ingest(&config, &store, &NoProgress, false).await.unwrap();

    // The unreadable walk is a reported failure, not a silent empty run.
    assert!(report.failed >= 1);
    assert_eq!(report.records, 0);
    assert_eq!(store.count().await.unwrap(), 0);

    restore(&src);
}

#[tokio::test]
async fn missing_source_dir_fails_before_reset() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp.path().join("nope"), &tmp.path().join("index"));

    let store = MemoryStore::new();
    let err = run_ingest(&config, &store, &NoProgress, false)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Source directory"));
    // Nothing destructive happened.
    assert_eq!(store.reset_count(), 0);
}
