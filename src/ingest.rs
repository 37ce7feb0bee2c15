//! Ingestion pipeline orchestration.
//!
//! Drives the full rebuild: store reset → discovery/extraction → chunking
//! and loading. Every run replaces the persisted index wholesale, so the
//! store always reflects exactly the current on-disk corpus. Extraction
//! failures are file-scoped and isolated; a store-write failure aborts the
//! run, because no partial-index invariant is maintained otherwise.

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::chunk::split_text;
use crate::config::Config;
use crate::extract::{extract_file, extract_records, ExtractError, Extraction, FileKind};
use crate::models::{Chunk, IngestReport, SourceMeta, SourceRecord};
use crate::progress::{IngestEvent, ProgressReporter};
use crate::store::VectorStore;

/// Run one ingestion pass.
///
/// With `dry_run` set, discovery, extraction, and chunk counting all
/// happen, but the store is neither reset nor written. Without it, the
/// reset completes before any write begins; that ordering is a hard
/// barrier.
pub async fn run_ingest(
    config: &Config,
    store: &dyn VectorStore,
    progress: &dyn ProgressReporter,
    dry_run: bool,
) -> Result<IngestReport> {
    let source_dir = &config.source.dir;
    if !source_dir.is_dir() {
        bail!("Source directory does not exist: {}", source_dir.display());
    }

    // Phase 1: reset. Full rebuild, never an incremental merge.
    if !dry_run {
        progress.report(IngestEvent::Resetting {
            location: config.store.location.display().to_string(),
        });
        store.reset().await?;
    }

    // Phase 2: discover and extract.
    progress.report(IngestEvent::Scanning {
        dir: source_dir.display().to_string(),
    });
    let mut report = IngestReport::default();
    let records = discover_and_extract(config, progress, &mut report);

    // Phase 3: chunk and load, one store call per record.
    let total = records.len() as u64;
    let mut n = 0u64;
    for record in &records {
        n += 1;

        if record.raw_text.trim().is_empty() {
            report.skipped += 1;
            progress.report(IngestEvent::Skipped {
                subject: record.identifier.clone(),
                reason: "empty text".to_string(),
            });
            continue;
        }

        // Ids are minted fresh at ingestion time: every run, even of
        // identical content, produces new ones.
        let chunks: Vec<Chunk> = split_text(
            &record.raw_text,
            config.chunking.max_size,
            config.chunking.overlap,
        )
        .into_iter()
        .map(|text| Chunk {
            id: Uuid::new_v4().to_string(),
            text,
            meta: record.meta(),
        })
        .collect();
        if chunks.is_empty() {
            report.skipped += 1;
            continue;
        }

        if !dry_run {
            let ids: Vec<String> = chunks.iter().map(|c| c.id.clone()).collect();
            let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
            let metas: Vec<SourceMeta> = chunks.iter().map(|c| c.meta.clone()).collect();
            store.add(&ids, &texts, &metas).await?;
        }

        progress.report(IngestEvent::Ingesting {
            title: record.title.clone(),
            n,
            total,
        });
        report.records += 1;
        report.chunks += chunks.len() as u64;
    }

    Ok(report)
}

/// Enumerate the source directory (direct entries only) plus the
/// fixed-name records file, and extract everything. The records file is
/// always attempted first; file-level extraction failures are reported
/// and isolated from the rest of the run.
fn discover_and_extract(
    config: &Config,
    progress: &dyn ProgressReporter,
    report: &mut IngestReport,
) -> Vec<SourceRecord> {
    let mut records = Vec::new();

    let records_path = config.source.dir.join(&config.source.records_file);
    if records_path.is_file() {
        collect(
            extract_records(&records_path),
            &records_path,
            &mut records,
            progress,
            report,
        );
    }

    for entry in WalkDir::new(&config.source.dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        // Walk errors (unreadable entries) are observable failures, not
        // silent drops.
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.failed += 1;
                progress.report(IngestEvent::Failed {
                    path: e
                        .path()
                        .unwrap_or(config.source.dir.as_path())
                        .display()
                        .to_string(),
                    error: e.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        // The records file was already handled above, regardless of its
        // extension.
        if entry.file_name().to_string_lossy() == config.source.records_file.as_str() {
            continue;
        }

        let kind = FileKind::from_path(path);
        if kind == FileKind::Unsupported {
            report.skipped += 1;
            progress.report(IngestEvent::Skipped {
                subject: path.display().to_string(),
                reason: "unsupported extension".to_string(),
            });
            continue;
        }

        collect(extract_file(path, kind), path, &mut records, progress, report);
    }

    records
}

fn collect(
    outcome: Result<Extraction, ExtractError>,
    path: &Path,
    records: &mut Vec<SourceRecord>,
    progress: &dyn ProgressReporter,
    report: &mut IngestReport,
) {
    match outcome {
        Ok(extraction) => {
            if extraction.dropped > 0 {
                report.skipped += extraction.dropped as u64;
                progress.report(IngestEvent::Skipped {
                    subject: path.display().to_string(),
                    reason: format!("{} element(s) without raw_text", extraction.dropped),
                });
            }
            records.extend(extraction.records);
        }
        Err(e) => {
            report.failed += 1;
            progress.report(IngestEvent::Failed {
                path: path.display().to_string(),
                error: e.to_string(),
            });
        }
    }
}

/// Paths considered by discovery, in processing order. Used by
/// `docfeed check` to show what a run would touch.
pub fn discovered_paths(config: &Config) -> Result<Vec<PathBuf>> {
    let source_dir = &config.source.dir;
    if !source_dir.is_dir() {
        bail!("Source directory does not exist: {}", source_dir.display());
    }

    let mut paths = Vec::new();
    let records_path = source_dir.join(&config.source.records_file);
    if records_path.is_file() {
        paths.push(records_path);
    }
    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy() == config.source.records_file.as_str() {
            continue;
        }
        if FileKind::from_path(entry.path()) != FileKind::Unsupported {
            paths.push(entry.path().to_path_buf());
        }
    }
    Ok(paths)
}
