//! The audit ledger facade — lifecycle and producer surface for the host.
//!
//! Lifecycle: `initialize` is the Uninitialized→Initialized transition (the
//! host composes the ledger at startup); `shutdown` is terminal. Every
//! producer call converts internal errors to a boolean so the ledger can
//! never crash the host's trading loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use auditchain_core::{
    audit_trail, chain_stats, AuditRecord, Block, ChainStats, ChainStore, LedgerConfig,
    LedgerError, LedgerStore, RecordType, TrailFilter, Transaction,
};
use auditchain_storage::SqliteStorage;

use crate::miner::MinerHandle;

/// How long `shutdown` waits for the mining task to exit.
const SHUTDOWN_WAIT: Duration = Duration::from_secs(5);

/// Facade over the chain store, storage, and background miner.
pub struct AuditLedger {
    config: LedgerConfig,
    chain: Arc<ChainStore>,
    miner: Mutex<Option<MinerHandle>>,
    shut_down: AtomicBool,
}

impl AuditLedger {
    /// Initialize the ledger: open durable storage when `db_path` is set,
    /// reload or create the chain, and start the background miner when
    /// `auto_mine` is on.
    ///
    /// Configuration problems (an unusable storage path) are fatal here and
    /// nowhere else.
    pub async fn initialize(config: LedgerConfig) -> Result<Self, LedgerError> {
        let store: Option<Arc<dyn LedgerStore>> = match &config.db_path {
            Some(path) => {
                let path = path.to_str().ok_or_else(|| {
                    LedgerError::Config(format!(
                        "db_path is not valid UTF-8: {}",
                        path.display()
                    ))
                })?;
                Some(Arc::new(SqliteStorage::open(path).await?))
            }
            None => None,
        };
        Self::with_store(config, store).await
    }

    /// Initialize against an explicit storage backend (or none), for hosts
    /// and tests that manage storage themselves. `db_path` is ignored.
    pub async fn with_store(
        config: LedgerConfig,
        store: Option<Arc<dyn LedgerStore>>,
    ) -> Result<Self, LedgerError> {
        let chain = Arc::new(ChainStore::open(config.difficulty, store).await?);
        let ledger = Self {
            chain,
            miner: Mutex::new(None),
            shut_down: AtomicBool::new(false),
            config,
        };
        if ledger.config.auto_mine {
            ledger.start_miner().await;
        }
        info!(
            difficulty = ledger.config.difficulty,
            auto_mine = ledger.config.auto_mine,
            "audit ledger initialized"
        );
        Ok(ledger)
    }

    async fn start_miner(&self) {
        let mut miner = self.miner.lock().await;
        if miner.as_ref().is_some_and(|m| m.is_running()) {
            return;
        }
        *miner = Some(MinerHandle::spawn(
            Arc::clone(&self.chain),
            self.config.mining_interval(),
        ));
    }

    /// The configuration this ledger was initialized with.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Returns `true` once `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    // ─── Producer surface ────────────────────────────────────────────────────

    /// Queue a trade record. Returns `false` when trades are disabled in the
    /// configuration, the ledger is shut down, or persistence failed.
    pub async fn record_trade(&self, data: Value) -> bool {
        self.record(RecordType::Trade, data).await
    }

    /// Queue an order record.
    pub async fn record_order(&self, data: Value) -> bool {
        self.record(RecordType::Order, data).await
    }

    /// Queue a system-change record.
    pub async fn record_system_change(&self, data: Value) -> bool {
        self.record(RecordType::SystemChange, data).await
    }

    /// Queue a login record.
    pub async fn record_login(&self, data: Value) -> bool {
        self.record(RecordType::Login, data).await
    }

    /// Queue a configuration-change record.
    pub async fn record_config_change(&self, data: Value) -> bool {
        self.record(RecordType::ConfigChange, data).await
    }

    async fn record(&self, kind: RecordType, data: Value) -> bool {
        if self.is_shut_down() {
            warn!(%kind, "record rejected: ledger is shut down");
            return false;
        }
        if !self.config.records(kind) {
            debug!(%kind, "record type disabled in configuration");
            return false;
        }
        match self.chain.add_transaction(Transaction::new(kind, data)).await {
            Ok(()) => {
                debug!(%kind, "transaction recorded");
                true
            }
            Err(e) => {
                error!(%kind, error = %e, "failed to record transaction");
                false
            }
        }
    }

    // ─── Read surface ────────────────────────────────────────────────────────

    /// Filtered, newest-first view over all sealed transactions.
    pub async fn get_audit_trail(&self, filter: &TrailFilter) -> Vec<AuditRecord> {
        let blocks = self.chain.blocks().await;
        audit_trail(&blocks, filter)
    }

    /// Explicitly verify hash and linkage integrity of the whole chain.
    ///
    /// Reports tampering rather than failing, so reads stay available for
    /// forensic inspection of a compromised chain.
    pub async fn verify_chain_integrity(&self) -> bool {
        self.chain.is_valid().await
    }

    /// Aggregate chain statistics, internally consistent under one lock.
    pub async fn get_chain_stats(&self) -> ChainStats {
        let (blocks, pending) = self.chain.snapshot().await;
        chain_stats(&blocks, pending)
    }

    /// Look up a sealed block by index.
    pub async fn get_block(&self, index: u64) -> Option<Block> {
        self.chain.block_by_index(index).await
    }

    /// Look up a sealed block by hash.
    pub async fn get_block_by_hash(&self, hash: &str) -> Option<Block> {
        self.chain.block_by_hash(hash).await
    }

    /// Seal the pending queue immediately, without waiting for the miner.
    ///
    /// Returns the new block, or `None` when the queue was empty or the
    /// durability write failed (logged).
    pub async fn force_mine(&self) -> Option<Block> {
        match self.chain.mine_pending().await {
            Ok(block) => block,
            Err(e) => {
                error!(error = %e, "forced mining failed");
                None
            }
        }
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────────

    /// Stop the background miner (bounded wait) and seal anything still
    /// pending, so no transaction submitted before shutdown is dropped.
    ///
    /// Terminal and idempotent: repeat calls return `true` without effect.
    pub async fn shutdown(&self) -> bool {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return true;
        }
        if let Some(miner) = self.miner.lock().await.take() {
            miner.stop(SHUTDOWN_WAIT).await;
        }
        match self.chain.mine_pending().await {
            Ok(Some(block)) => info!(index = block.index, "final flush sealed block"),
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "final flush failed");
                return false;
            }
        }
        info!("audit ledger shut down");
        true
    }
}
