//! SQLite storage backend for the audit ledger.
//!
//! Persists sealed blocks and the pending queue to a single SQLite file.
//! Uses `sqlx` with WAL mode for concurrent read performance.
//!
//! # Usage
//! ```rust,no_run
//! use auditchain_storage::sqlite::SqliteStorage;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStorage::open("./data/audit_chain.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStorage::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use auditchain_core::{Block, BlockPayload, LedgerError, LedgerStore, Transaction};

/// SQLite-backed storage for the chain and pending queue.
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// Parent directories are created when missing. The path may be a plain
    /// file path (`"./audit_chain.db"`) or a full SQLite URL
    /// (`"sqlite:./audit_chain.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, LedgerError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        LedgerError::Config(format!(
                            "cannot create storage directory {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
            }
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Open an in-memory SQLite database.
    ///
    /// All data is lost when the pool is dropped. Ideal for tests.
    pub async fn in_memory() -> Result<Self, LedgerError> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let storage = Self { pool };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Create tables and enable WAL mode.
    async fn init_schema(&self) -> Result<(), LedgerError> {
        // WAL mode — better concurrent read throughput
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        // One row per sealed block, ordered by index
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS blocks (
                block_index     INTEGER PRIMARY KEY,
                block_timestamp TEXT    NOT NULL,
                payload         TEXT    NOT NULL,
                previous_hash   TEXT    NOT NULL,
                nonce           INTEGER NOT NULL,
                hash            TEXT    NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;

        // One row per currently pending transaction
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS pending_transactions (
                id   INTEGER PRIMARY KEY AUTOINCREMENT,
                data TEXT NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;

        Ok(())
    }

    fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, LedgerError> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| LedgerError::Storage(format!("bad block timestamp '{raw}': {e}")))
    }
}

#[async_trait]
impl LedgerStore for SqliteStorage {
    async fn load_blocks(&self) -> Result<Vec<Block>, LedgerError> {
        let rows = sqlx::query(
            "SELECT block_index, block_timestamp, payload, previous_hash, nonce, hash
             FROM blocks ORDER BY block_index",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let mut blocks = Vec::with_capacity(rows.len());
        for row in rows {
            let timestamp = Self::parse_timestamp(&row.get::<String, _>("block_timestamp"))?;
            let payload: BlockPayload =
                serde_json::from_str(&row.get::<String, _>("payload"))
                    .map_err(|e| LedgerError::Storage(format!("bad block payload: {e}")))?;

            // Stored hash is trusted here; validation is an explicit step.
            blocks.push(Block::from_parts(
                row.get::<i64, _>("block_index") as u64,
                timestamp,
                payload,
                row.get("previous_hash"),
                row.get::<i64, _>("nonce") as u64,
                row.get("hash"),
            ));
        }
        Ok(blocks)
    }

    async fn load_pending(&self) -> Result<Vec<Transaction>, LedgerError> {
        let rows = sqlx::query("SELECT data FROM pending_transactions ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        let mut pending = Vec::with_capacity(rows.len());
        for row in rows {
            let tx: Transaction = serde_json::from_str(&row.get::<String, _>("data"))
                .map_err(|e| LedgerError::Storage(format!("bad pending transaction: {e}")))?;
            pending.push(tx);
        }
        Ok(pending)
    }

    async fn append_block(&self, block: &Block) -> Result<(), LedgerError> {
        let payload = serde_json::to_string(&block.payload)
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        sqlx::query(
            "INSERT INTO blocks (block_index, block_timestamp, payload, previous_hash, nonce, hash)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(block.index as i64)
        .bind(block.timestamp.to_rfc3339())
        .bind(&payload)
        .bind(&block.previous_hash)
        .bind(block.nonce as i64)
        .bind(&block.hash)
        .execute(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))?;

        debug!(index = block.index, hash = %block.hash, "block persisted");
        Ok(())
    }

    async fn replace_pending(&self, pending: &[Transaction]) -> Result<(), LedgerError> {
        // Full rewrite; the queue is small between minings.
        sqlx::query("DELETE FROM pending_transactions")
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        for tx in pending {
            let data = serde_json::to_string(tx)
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
            sqlx::query("INSERT INTO pending_transactions (data) VALUES (?)")
                .bind(&data)
                .execute(&self.pool)
                .await
                .map_err(|e| LedgerError::Storage(e.to_string()))?;
        }

        debug!(pending = pending.len(), "pending queue persisted");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
