//! Chain store — owns the block sequence and the pending queue.
//!
//! All mutation goes through one `tokio::sync::Mutex`. Proof-of-work for a
//! new block runs while that lock is held, so mining and submission are
//! mutually exclusive: concurrent submitters wait for the lock and their
//! transactions land in the next mining cycle, never lost, never duplicated
//! across a mining boundary.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::block::{Block, BlockPayload, GENESIS_PREVIOUS_HASH};
use crate::error::LedgerError;
use crate::store::LedgerStore;
use crate::types::{RecordType, Transaction};

struct ChainState {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    /// Blocks known durable: `chain[..persisted]` has been appended to the
    /// store. Trails `chain.len()` after a failed append until the next seal
    /// retries the backlog.
    persisted: usize,
}

/// Owns the chain and the pending queue; the sole mutation point.
pub struct ChainStore {
    state: Mutex<ChainState>,
    difficulty: usize,
    store: Option<Arc<dyn LedgerStore>>,
}

impl ChainStore {
    /// Open a chain store, reloading prior state from `store` when present.
    ///
    /// Reconstruction takes precedence over creating a fresh genesis block;
    /// a brand-new durable store gets the genesis block written immediately.
    pub async fn open(
        difficulty: usize,
        store: Option<Arc<dyn LedgerStore>>,
    ) -> Result<Self, LedgerError> {
        let (chain, pending) = match &store {
            Some(backend) => {
                let blocks = backend.load_blocks().await?;
                let pending = backend.load_pending().await?;
                if blocks.is_empty() {
                    let genesis = Self::genesis_block();
                    backend.append_block(&genesis).await?;
                    info!(hash = %genesis.hash, "created genesis block");
                    (vec![genesis], pending)
                } else {
                    info!(
                        blocks = blocks.len(),
                        pending = pending.len(),
                        "reloaded ledger from storage"
                    );
                    (blocks, pending)
                }
            }
            None => {
                let genesis = Self::genesis_block();
                info!(hash = %genesis.hash, "created genesis block");
                (vec![genesis], Vec::new())
            }
        };

        let persisted = chain.len();
        Ok(Self {
            state: Mutex::new(ChainState {
                chain,
                pending,
                persisted,
            }),
            difficulty,
            store,
        })
    }

    fn genesis_block() -> Block {
        Block::new(
            0,
            Utc::now(),
            BlockPayload::genesis(),
            GENESIS_PREVIOUS_HASH,
            0,
        )
    }

    /// Configured proof-of-work difficulty.
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    // ─── Mutation ─────────────────────────────────────────────────────────────

    /// Append a transaction to the pending queue.
    ///
    /// O(1) beyond lock and persistence cost. On a persistence failure the
    /// in-memory queue keeps the transaction and the error is reported.
    pub async fn add_transaction(&self, tx: Transaction) -> Result<(), LedgerError> {
        let mut state = self.state.lock().await;
        state.pending.push(tx);
        debug!(pending = state.pending.len(), "transaction queued");
        self.persist_pending(&state).await
    }

    /// Seal the current pending queue into one new mined block.
    ///
    /// Returns `Ok(None)` when the queue is empty. The queue snapshot and
    /// clear happen atomically under the lock; the proof-of-work search runs
    /// inside the same critical section. Blocks whose durable append failed
    /// on an earlier seal are retried here first, so a transient storage
    /// failure never leaves a gap in the persisted chain.
    pub async fn mine_pending(&self) -> Result<Option<Block>, LedgerError> {
        let mut state = self.state.lock().await;

        if state.persisted < state.chain.len() {
            self.persist_chain_tail(&mut state).await?;
            self.persist_pending(&state).await?;
        }
        if state.pending.is_empty() {
            return Ok(None);
        }

        let transactions = std::mem::take(&mut state.pending);
        let previous_hash = state
            .chain
            .last()
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());

        let mut block = Block::new(
            state.chain.len() as u64,
            Utc::now(),
            BlockPayload::Sealed {
                transactions,
                mined_at: Utc::now(),
            },
            previous_hash,
            0,
        );
        block.mine(self.difficulty);
        info!(
            index = block.index,
            nonce = block.nonce,
            transactions = block.transactions().len(),
            hash = %block.hash,
            "sealed block"
        );
        state.chain.push(block.clone());

        self.persist_chain_tail(&mut state).await?;
        self.persist_pending(&state).await?;
        Ok(Some(block))
    }

    /// Append every block in `chain[persisted..]` to the store, in order,
    /// advancing the watermark per success so a mid-tail failure resumes
    /// where it stopped.
    async fn persist_chain_tail(&self, state: &mut ChainState) -> Result<(), LedgerError> {
        let Some(store) = &self.store else {
            state.persisted = state.chain.len();
            return Ok(());
        };
        while state.persisted < state.chain.len() {
            let block = state.chain[state.persisted].clone();
            if let Err(e) = store.append_block(&block).await {
                warn!(error = %e, index = block.index, "failed to persist sealed block");
                return Err(e);
            }
            state.persisted += 1;
        }
        Ok(())
    }

    async fn persist_pending(&self, state: &ChainState) -> Result<(), LedgerError> {
        if let Some(store) = &self.store {
            if let Err(e) = store.replace_pending(&state.pending).await {
                warn!(error = %e, "failed to persist pending queue");
                return Err(e);
            }
        }
        Ok(())
    }

    // ─── Reads ────────────────────────────────────────────────────────────────

    /// Verify stored hashes and predecessor linkage from index 1 onward.
    pub async fn is_valid(&self) -> bool {
        let state = self.state.lock().await;
        validate_blocks(&state.chain)
    }

    /// Clone of the full chain.
    pub async fn blocks(&self) -> Vec<Block> {
        self.state.lock().await.chain.clone()
    }

    /// Chain clone plus pending count under a single lock acquisition, for
    /// internally consistent statistics.
    pub async fn snapshot(&self) -> (Vec<Block>, usize) {
        let state = self.state.lock().await;
        (state.chain.clone(), state.pending.len())
    }

    /// Number of transactions waiting to be sealed.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// O(1) lookup by block index.
    pub async fn block_by_index(&self, index: u64) -> Option<Block> {
        self.state.lock().await.chain.get(index as usize).cloned()
    }

    /// O(n) lookup by block hash.
    pub async fn block_by_hash(&self, hash: &str) -> Option<Block> {
        self.state
            .lock()
            .await
            .chain
            .iter()
            .find(|b| b.hash == hash)
            .cloned()
    }

    /// All sealed transactions of `kind`, oldest first.
    pub async fn transactions_by_type(&self, kind: RecordType) -> Vec<Transaction> {
        let state = self.state.lock().await;
        state
            .chain
            .iter()
            .flat_map(|b| b.transactions())
            .filter(|tx| tx.kind == kind)
            .cloned()
            .collect()
    }
}

/// Verify that each block's stored hash matches a recomputation and that its
/// `previous_hash` links to its predecessor. Fail-fast: returns `false` at
/// the first violation.
///
/// The genesis block (index 0) anchors the chain and is not recomputed.
pub fn validate_blocks(blocks: &[Block]) -> bool {
    for i in 1..blocks.len() {
        let current = &blocks[i];
        let previous = &blocks[i - 1];
        if current.hash != current.calculate_hash() {
            warn!(index = current.index, "block hash does not match recomputation");
            return false;
        }
        if current.previous_hash != previous.hash {
            warn!(index = current.index, "block linkage broken");
            return false;
        }
    }
    true
}

// ─── Tests ───────────────────────────────────────────────────────────────────
