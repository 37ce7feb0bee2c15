//! Core data models used throughout docfeed.
//!
//! These types represent the records and chunks that flow through the
//! ingestion pipeline. A [`SourceRecord`] is produced by exactly one
//! extractor invocation and consumed once by the chunker; it is never
//! persisted itself. Only [`Chunk`]s reach the vector store.

use serde::{Deserialize, Serialize};

/// Normalized document produced by a format extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    /// Stable reference to the origin: file path, URL, or logical key.
    /// Duplicates are tolerated and simply re-ingested.
    pub identifier: String,
    /// Human-readable label; defaults to the filename without extension.
    pub title: String,
    /// Full extracted text, possibly empty. Records whose text is empty
    /// or whitespace-only are dropped before chunking.
    pub raw_text: String,
}

/// Source metadata copied onto every chunk of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMeta {
    pub identifier: String,
    pub title: String,
}

impl SourceRecord {
    pub fn meta(&self) -> SourceMeta {
        SourceMeta {
            identifier: self.identifier.clone(),
            title: self.title.clone(),
        }
    }
}

/// A bounded-length text segment of a record, the unit submitted for
/// embedding. Ids are minted fresh (UUID v4) on every ingestion run and
/// never derived from content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub meta: SourceMeta,
}

/// Counters accumulated over one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records that produced at least one stored chunk.
    pub records: u64,
    /// Chunks embedded and persisted.
    pub chunks: u64,
    /// Skip events: unsupported extensions, blank records, dropped
    /// JSON elements.
    pub skipped: u64,
    /// Files whose extraction failed and was isolated from the run.
    pub failed: u64,
}
