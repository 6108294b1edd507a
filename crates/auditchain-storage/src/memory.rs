//! In-memory storage backend.
//!
//! Mirrors the chain and pending queue in RAM. Useful for tests and ledgers
//! that don't need restart-safe durability.

use std::sync::Mutex;

use async_trait::async_trait;

use auditchain_core::{Block, LedgerError, LedgerStore, Transaction};

/// In-memory ledger storage.
///
/// All data is lost when the value is dropped.
#[derive(Default)]
pub struct MemoryStorage {
    blocks: Mutex<Vec<Block>>,
    pending: Mutex<Vec<Transaction>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.lock().unwrap().len()
    }

    /// Number of persisted pending transactions.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerStore for MemoryStorage {
    async fn load_blocks(&self) -> Result<Vec<Block>, LedgerError> {
        Ok(self.blocks.lock().unwrap().clone())
    }

    async fn load_pending(&self) -> Result<Vec<Transaction>, LedgerError> {
        Ok(self.pending.lock().unwrap().clone())
    }

    async fn append_block(&self, block: &Block) -> Result<(), LedgerError> {
        self.blocks.lock().unwrap().push(block.clone());
        Ok(())
    }

    async fn replace_pending(&self, pending: &[Transaction]) -> Result<(), LedgerError> {
        *self.pending.lock().unwrap() = pending.to_vec();
        Ok(())
    }
}
