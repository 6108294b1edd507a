//! Block — an immutable, content-addressed unit of the ledger.
//!
//! A block's hash covers its index, timestamp, payload, predecessor hash, and
//! nonce, so any change to any field invalidates it. Proof-of-work here is a
//! sealing/rate-limiting device, not adversarial security: difficulty stays
//! small so `mine` completes well under a second.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::Transaction;

/// `previous_hash` of the genesis block, which has no real predecessor.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

// ─── BlockPayload ────────────────────────────────────────────────────────────

/// What a block carries: a sealed transaction batch, or the genesis marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockPayload {
    /// Payload of a mined block — the pending-queue snapshot it sealed.
    Sealed {
        transactions: Vec<Transaction>,
        mined_at: DateTime<Utc>,
    },
    /// Payload of the genesis block (index 0).
    Genesis { message: String },
}

impl BlockPayload {
    /// The standard genesis payload.
    pub fn genesis() -> Self {
        Self::Genesis {
            message: "Genesis Block".to_string(),
        }
    }

    /// Transactions carried by this payload (empty for genesis).
    pub fn transactions(&self) -> &[Transaction] {
        match self {
            Self::Sealed { transactions, .. } => transactions,
            Self::Genesis { .. } => &[],
        }
    }
}

// ─── Block ───────────────────────────────────────────────────────────────────

/// An immutable, self-verifying unit of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain; 0 is genesis.
    pub index: u64,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    pub payload: BlockPayload,
    /// Hash of the predecessor block (`"0"` for genesis).
    pub previous_hash: String,
    /// Proof-of-work counter.
    pub nonce: u64,
    /// SHA-256 digest over the canonicalized header fields.
    pub hash: String,
}

impl Block {
    /// Construct a block, eagerly computing its hash.
    pub fn new(
        index: u64,
        timestamp: DateTime<Utc>,
        payload: BlockPayload,
        previous_hash: impl Into<String>,
        nonce: u64,
    ) -> Self {
        let mut block = Self {
            index,
            timestamp,
            payload,
            previous_hash: previous_hash.into(),
            nonce,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Rebuild a block from persisted fields, trusting the stored hash.
    ///
    /// Integrity verification is a separate, explicit step
    /// ([`crate::chain::validate_blocks`]) — never implicit on load.
    pub fn from_parts(
        index: u64,
        timestamp: DateTime<Utc>,
        payload: BlockPayload,
        previous_hash: String,
        nonce: u64,
        hash: String,
    ) -> Self {
        Self {
            index,
            timestamp,
            payload,
            previous_hash,
            nonce,
            hash,
        }
    }

    /// SHA-256 over the key-sorted JSON form of the header fields.
    ///
    /// `serde_json` serializes objects with sorted keys by default (its map
    /// type is a `BTreeMap`), which makes this serialization canonical and
    /// the digest deterministic.
    pub fn calculate_hash(&self) -> String {
        let canonical = serde_json::json!({
            "index": self.index,
            "timestamp": self.timestamp,
            "payload": self.payload,
            "previous_hash": self.previous_hash,
            "nonce": self.nonce,
        });
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Proof-of-work search: bump the nonce and rehash until the digest
    /// starts with `difficulty` zeros.
    ///
    /// Expected iteration count grows as `16^difficulty`; difficulty 0 leaves
    /// the eagerly computed hash untouched.
    pub fn mine(&mut self, difficulty: usize) {
        let target = "0".repeat(difficulty);
        while !self.hash.starts_with(&target) {
            self.nonce += 1;
            self.hash = self.calculate_hash();
        }
    }

    /// Transactions sealed into this block (empty for genesis).
    pub fn transactions(&self) -> &[Transaction] {
        self.payload.transactions()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordType;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap()
    }

    fn sealed_payload() -> BlockPayload {
        BlockPayload::Sealed {
            transactions: vec![Transaction::with_timestamp(
                RecordType::Trade,
                serde_json::json!({"symbol": "BTC/USD", "qty": 1}),
                fixed_time(),
            )],
            mined_at: fixed_time(),
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let a = Block::new(1, fixed_time(), sealed_payload(), "abc", 0);
        let b = Block::new(1, fixed_time(), sealed_payload(), "abc", 0);
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.hash, a.calculate_hash());
    }

    #[test]
    fn any_field_change_changes_the_hash() {
        let base = Block::new(1, fixed_time(), sealed_payload(), "abc", 0);
        let other_index = Block::new(2, fixed_time(), sealed_payload(), "abc", 0);
        let other_prev = Block::new(1, fixed_time(), sealed_payload(), "abd", 0);
        let other_nonce = Block::new(1, fixed_time(), sealed_payload(), "abc", 1);
        assert_ne!(base.hash, other_index.hash);
        assert_ne!(base.hash, other_prev.hash);
        assert_ne!(base.hash, other_nonce.hash);
    }

    #[test]
    fn mine_produces_leading_zeros() {
        let mut block = Block::new(1, fixed_time(), sealed_payload(), "abc", 0);
        block.mine(2);
        assert!(block.hash.starts_with("00"));
        assert_eq!(block.hash, block.calculate_hash());
    }

    #[test]
    fn mine_at_zero_difficulty_is_a_noop() {
        let mut block = Block::new(1, fixed_time(), sealed_payload(), "abc", 0);
        let before = block.hash.clone();
        block.mine(0);
        assert_eq!(block.hash, before);
        assert_eq!(block.nonce, 0);
    }

    #[test]
    fn genesis_payload_has_no_transactions() {
        let genesis = Block::new(
            0,
            fixed_time(),
            BlockPayload::genesis(),
            GENESIS_PREVIOUS_HASH,
            0,
        );
        assert!(genesis.transactions().is_empty());
        assert_eq!(genesis.previous_hash, "0");
    }

    #[test]
    fn payload_serde_roundtrip() {
        let payload = sealed_payload();
        let json = serde_json::to_string(&payload).unwrap();
        let back: BlockPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);

        let genesis = BlockPayload::genesis();
        let json = serde_json::to_string(&genesis).unwrap();
        let back: BlockPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, genesis);
    }
}
