//! # docfeed CLI
//!
//! The `docfeed` binary rebuilds a local vector index from a directory of
//! documents. It runs to completion and exits.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docfeed ingest` | Reset the store and ingest the source directory |
//! | `docfeed ingest --dry-run` | Extract and count chunks without touching the store |
//! | `docfeed check` | Validate configuration and list what a run would ingest |
//!
//! All commands accept a `--config` flag pointing to a TOML configuration
//! file. See `config/docfeed.example.toml` for a full example.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use docfeed::config::load_config;
use docfeed::embedding::create_provider;
use docfeed::ingest::{discovered_paths, run_ingest};
use docfeed::progress::ProgressMode;
use docfeed::store::SqliteStore;

/// docfeed — bulk document ingestion into a locally persisted vector index.
#[derive(Parser)]
#[command(
    name = "docfeed",
    about = "Bulk document ingestion into a locally persisted vector index",
    version,
    long_about = "docfeed normalizes a directory of heterogeneous documents (PDF, DOCX, plain \
    text, CSV, JSON arrays, line-delimited JSON records) into overlapping text chunks and \
    bulk-loads the embedded chunks into a local vector store. Every run is a full rebuild."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docfeed.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the vector index from the source directory.
    ///
    /// Destroys the persisted store, then extracts, chunks, embeds, and
    /// loads every supported file. Extraction failures are reported and
    /// skipped; an embedding or store failure aborts the run.
    Ingest {
        /// Extract and count chunks without resetting or writing the store.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr.
        #[arg(long, value_enum)]
        progress: Option<ProgressArg>,
    },

    /// Validate configuration and list what a run would ingest.
    Check,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProgressArg {
    Off,
    Human,
    Json,
}

impl From<ProgressArg> for ProgressMode {
    fn from(arg: ProgressArg) -> Self {
        match arg {
            ProgressArg::Off => ProgressMode::Off,
            ProgressArg::Human => ProgressMode::Human,
            ProgressArg::Json => ProgressMode::Json,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    // Configuration must be valid before anything destructive happens.
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Ingest { dry_run, progress } => {
            let mode = progress
                .map(ProgressMode::from)
                .unwrap_or_else(ProgressMode::default_for_tty);
            let reporter = mode.reporter();

            let store = SqliteStore::new(config.store.clone(), config.embedding.clone())?;
            let report = run_ingest(&config, &store, reporter.as_ref(), dry_run).await?;

            if dry_run {
                println!("ingest (dry-run)");
            } else {
                println!("ingest");
            }
            println!("  records ingested: {}", report.records);
            println!("  chunks ingested: {}", report.chunks);
            println!("  skipped: {}", report.skipped);
            println!("  failed files: {}", report.failed);
            println!("ok");
        }
        Commands::Check => {
            let provider = create_provider(&config.embedding)?;
            let paths = discovered_paths(&config)?;
            println!("config ok");
            println!("  source dir: {}", config.source.dir.display());
            println!("  store location: {}", config.store.location.display());
            println!("  collection: {}", config.store.collection);
            println!(
                "  embedding: {} ({} dims via {})",
                provider.model_name(),
                provider.dims(),
                config.embedding.provider
            );
            println!(
                "  chunking: max_size={} overlap={}",
                config.chunking.max_size, config.chunking.overlap
            );
            println!("  files to ingest: {}", paths.len());
            for path in paths {
                println!("    {}", path.display());
            }
        }
    }

    Ok(())
}
