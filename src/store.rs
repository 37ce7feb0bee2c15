//! Vector store abstraction and implementations.
//!
//! The store owns embedding: one [`VectorStore::add`] call embeds a
//! record's chunk batch and persists it atomically. The whole persisted
//! location is destroyed by [`VectorStore::reset`] at the start of every
//! ingestion run; there is no incremental merge with a prior run.
//!
//! Two implementations:
//! - **[`SqliteStore`]** — SQLite via sqlx; vectors stored as
//!   little-endian f32 BLOBs ([`vec_to_blob`] / [`blob_to_vec`]).
//! - **[`MemoryStore`]** — in-memory, for tests and dry wiring.

use anyhow::{bail, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::OnceCell;

use crate::config::{EmbeddingConfig, StoreConfig};
use crate::embedding::{create_provider, embed_texts, EmbeddingProvider};
use crate::models::SourceMeta;

/// Persistence contract for the ingestion pipeline.
///
/// `reset` must complete before the first `add`; the orchestrator enforces
/// that ordering. `add` slices must have matching lengths.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Destroy all persisted entries at the configured location.
    async fn reset(&self) -> Result<()>;
    /// Embed and persist one batch. All-or-nothing per call.
    async fn add(&self, ids: &[String], texts: &[String], metas: &[SourceMeta]) -> Result<()>;
    /// Number of persisted entries.
    async fn count(&self) -> Result<u64>;
}

/// Encode an embedding vector as little-endian bytes for BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(vec.len() * 4);
    for v in vec {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob
}

/// Decode a BLOB back into an embedding vector.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

// ============ SQLite store ============

/// SQLite-backed vector store.
///
/// The store location is a directory; the database lives at
/// `<location>/<collection>.sqlite`. `reset` removes the whole directory;
/// the connection pool is opened lazily on first write so the reset never
/// races an open handle.
pub struct SqliteStore {
    store: StoreConfig,
    embedding: EmbeddingConfig,
    provider: Box<dyn EmbeddingProvider>,
    pool: OnceCell<SqlitePool>,
}

impl SqliteStore {
    /// Constructs the embedding provider up front so a bad model or
    /// provider fails before anything destructive happens.
    pub fn new(store: StoreConfig, embedding: EmbeddingConfig) -> Result<Self> {
        let provider = create_provider(&embedding)?;
        Ok(Self {
            store,
            embedding,
            provider,
            pool: OnceCell::new(),
        })
    }

    fn db_path(&self) -> PathBuf {
        self.store
            .location
            .join(format!("{}.sqlite", self.store.collection))
    }

    async fn pool(&self) -> Result<&SqlitePool> {
        self.pool
            .get_or_try_init(|| async {
                std::fs::create_dir_all(&self.store.location)?;

                let options =
                    SqliteConnectOptions::from_str(&format!("sqlite:{}", self.db_path().display()))?
                        .create_if_missing(true)
                        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

                let pool = SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await?;

                sqlx::query(
                    r#"
                    CREATE TABLE IF NOT EXISTS entries (
                        id TEXT PRIMARY KEY,
                        collection TEXT NOT NULL,
                        identifier TEXT NOT NULL,
                        title TEXT NOT NULL,
                        text TEXT NOT NULL,
                        embedding BLOB NOT NULL
                    )
                    "#,
                )
                .execute(&pool)
                .await?;

                Ok::<_, anyhow::Error>(pool)
            })
            .await
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn reset(&self) -> Result<()> {
        if self.pool.get().is_some() {
            bail!("reset must run before the store is opened for writing");
        }
        if self.store.location.exists() {
            std::fs::remove_dir_all(&self.store.location)?;
        }
        Ok(())
    }

    async fn add(&self, ids: &[String], texts: &[String], metas: &[SourceMeta]) -> Result<()> {
        if ids.len() != texts.len() || ids.len() != metas.len() {
            bail!(
                "add: slice length mismatch (ids {}, texts {}, metas {})",
                ids.len(),
                texts.len(),
                metas.len()
            );
        }
        if ids.is_empty() {
            return Ok(());
        }

        let embeddings = embed_texts(self.provider.as_ref(), &self.embedding, texts).await?;

        let pool = self.pool().await?;
        let mut tx = pool.begin().await?;
        for ((id, (text, meta)), embedding) in ids
            .iter()
            .zip(texts.iter().zip(metas.iter()))
            .zip(embeddings.iter())
        {
            sqlx::query(
                "INSERT INTO entries (id, collection, identifier, title, text, embedding) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(&self.store.collection)
            .bind(&meta.identifier)
            .bind(&meta.title)
            .bind(text)
            .bind(vec_to_blob(embedding))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let pool = self.pool().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(pool)
            .await?;
        Ok(count as u64)
    }
}

// ============ In-memory store ============

/// One persisted entry of the in-memory store.
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    pub id: String,
    pub text: String,
    pub meta: SourceMeta,
}

/// In-memory [`VectorStore`] used by the integration tests. Skips real
/// embedding; batches land behind a mutex and resets are counted.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<MemoryEntry>>,
    resets: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<MemoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn reset_count(&self) -> u64 {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn reset(&self) -> Result<()> {
        self.entries.lock().unwrap().clear();
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn add(&self, ids: &[String], texts: &[String], metas: &[SourceMeta]) -> Result<()> {
        if ids.len() != texts.len() || ids.len() != metas.len() {
            bail!(
                "add: slice length mismatch (ids {}, texts {}, metas {})",
                ids.len(),
                texts.len(),
                metas.len()
            );
        }
        let mut entries = self.entries.lock().unwrap();
        for ((id, text), meta) in ids.iter().zip(texts.iter()).zip(metas.iter()) {
            entries.push(MemoryEntry {
                id: id.clone(),
                text: text.clone(),
                meta: meta.clone(),
            });
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.entries.lock().unwrap().len() as u64)
    }
}
