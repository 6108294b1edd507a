//! Storage seam — durable mirror of the chain and the pending queue.
//!
//! Backends live in `auditchain-storage` (`MemoryStorage`, `SqliteStorage`).

use async_trait::async_trait;

use crate::block::Block;
use crate::error::LedgerError;
use crate::types::Transaction;

/// Trait for persisting sealed blocks and the pending-transaction queue.
///
/// Contract: `load_blocks` returns blocks in index order and `load_pending`
/// returns transactions in submission order; stored hashes are trusted as-is
/// on load (verification is explicit, never implicit). Each sealed block is
/// appended at most once successfully; an `append_block` that returns an
/// error is retried with the same block on a later seal, so the persisted
/// chain never holds an index gap. `replace_pending` rewrites the whole
/// pending mirror on every queue mutation — the queue stays small between
/// minings, so delete-then-reinsert keeps the backend simple.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load every persisted block, ordered by index.
    async fn load_blocks(&self) -> Result<Vec<Block>, LedgerError>;

    /// Load the persisted pending queue, in submission order.
    async fn load_pending(&self) -> Result<Vec<Transaction>, LedgerError>;

    /// Persist one newly sealed block.
    async fn append_block(&self, block: &Block) -> Result<(), LedgerError>;

    /// Overwrite the persisted pending queue with `pending`.
    async fn replace_pending(&self, pending: &[Transaction]) -> Result<(), LedgerError>;
}
