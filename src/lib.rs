//! # docfeed
//!
//! Bulk document ingestion into a locally persisted vector index.
//!
//! docfeed normalizes a directory of heterogeneous documents (PDF, DOCX,
//! plain text, CSV, JSON arrays, line-delimited JSON records) into a
//! uniform record shape, splits long text into overlapping chunks, and
//! bulk-loads the embedded chunks into a vector store. Every run is a
//! full rebuild: the persisted store is destroyed up front, so after a
//! successful run the index reflects exactly the current corpus.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐
//! │ Extractors │──▶│  Chunker  │──▶│ Embedding │──▶│   Store   │
//! │ pdf/docx/… │   │  overlap  │   │  client   │   │  SQLite   │
//! └────────────┘   └───────────┘   └───────────┘   └───────────┘
//! ```
//!
//! ## Quick start
//!
//! ```bash
//! docfeed check                 # validate config, list discovered files
//! docfeed ingest --dry-run      # extract and count chunks, write nothing
//! docfeed ingest                # rebuild the index
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`extract`] | Per-format text extraction |
//! | [`chunk`] | Boundary-aware chunking with overlap |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Vector store trait and SQLite implementation |
//! | [`ingest`] | Ingestion orchestration |
//! | [`progress`] | Progress and skip-event reporting |

pub mod chunk;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod progress;
pub mod store;
