//! Read-only filtering and aggregation over the sealed chain.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::Block;
use crate::chain::validate_blocks;
use crate::types::{AuditRecord, RecordType};

/// Default maximum number of audit-trail records returned.
pub const DEFAULT_TRAIL_LIMIT: usize = 100;

// ─── TrailFilter ─────────────────────────────────────────────────────────────

/// Filter for [`audit_trail`]. Time bounds are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrailFilter {
    /// Only return records of this exact type.
    pub record_type: Option<RecordType>,
    /// Earliest accepted transaction timestamp.
    pub start_time: Option<DateTime<Utc>>,
    /// Latest accepted transaction timestamp.
    pub end_time: Option<DateTime<Utc>>,
    /// Maximum number of records returned, newest first.
    pub limit: usize,
}

impl Default for TrailFilter {
    fn default() -> Self {
        Self {
            record_type: None,
            start_time: None,
            end_time: None,
            limit: DEFAULT_TRAIL_LIMIT,
        }
    }
}

impl TrailFilter {
    /// Filter to a single record type.
    pub fn for_type(kind: RecordType) -> Self {
        Self {
            record_type: Some(kind),
            ..Default::default()
        }
    }

    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(kind) = self.record_type {
            if record.transaction.kind != kind {
                return false;
            }
        }
        if let Some(start) = self.start_time {
            if record.transaction.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_time {
            if record.transaction.timestamp > end {
                return false;
            }
        }
        true
    }
}

/// Flatten every block's transactions into audit records, filter, sort
/// newest-first, and truncate to the filter's limit.
pub fn audit_trail(blocks: &[Block], filter: &TrailFilter) -> Vec<AuditRecord> {
    let mut records: Vec<AuditRecord> = blocks
        .iter()
        .flat_map(|block| {
            block.transactions().iter().map(move |tx| AuditRecord {
                transaction: tx.clone(),
                block_index: block.index,
                block_hash: block.hash.clone(),
            })
        })
        .filter(|record| filter.matches(record))
        .collect();

    records.sort_by(|a, b| b.transaction.timestamp.cmp(&a.transaction.timestamp));
    records.truncate(filter.limit);
    records
}

// ─── ChainStats ──────────────────────────────────────────────────────────────

/// Aggregate statistics over a chain snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStats {
    pub chain_length: usize,
    pub total_transactions: usize,
    pub transaction_types: BTreeMap<RecordType, usize>,
    pub pending_transactions: usize,
    pub first_block_time: Option<DateTime<Utc>>,
    pub last_block_time: Option<DateTime<Utc>>,
    pub is_valid: bool,
}

/// Compute statistics for `blocks` with `pending` transactions still queued.
pub fn chain_stats(blocks: &[Block], pending: usize) -> ChainStats {
    let mut transaction_types = BTreeMap::new();
    let mut total = 0usize;
    for block in blocks {
        for tx in block.transactions() {
            total += 1;
            *transaction_types.entry(tx.kind).or_insert(0) += 1;
        }
    }

    ChainStats {
        chain_length: blocks.len(),
        total_transactions: total,
        transaction_types,
        pending_transactions: pending,
        first_block_time: blocks.first().map(|b| b.timestamp),
        last_block_time: blocks.last().map(|b| b.timestamp),
        is_valid: validate_blocks(blocks),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockPayload;
    use crate::types::Transaction;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, hour, 0, 0).unwrap()
    }

    fn sealed_block(index: u64, txs: Vec<Transaction>, previous_hash: &str) -> Block {
        Block::new(
            index,
            at(0),
            BlockPayload::Sealed {
                transactions: txs,
                mined_at: at(0),
            },
            previous_hash,
            0,
        )
    }

    fn sample_chain() -> Vec<Block> {
        let genesis = Block::new(0, at(0), BlockPayload::genesis(), "0", 0);
        let block1 = sealed_block(
            1,
            vec![
                Transaction::with_timestamp(RecordType::Trade, serde_json::json!({"id": 1}), at(1)),
                Transaction::with_timestamp(RecordType::Order, serde_json::json!({"id": 2}), at(2)),
            ],
            &genesis.hash,
        );
        let block2 = sealed_block(
            2,
            vec![Transaction::with_timestamp(
                RecordType::Trade,
                serde_json::json!({"id": 3}),
                at(3),
            )],
            &block1.hash,
        );
        vec![genesis, block1, block2]
    }

    #[test]
    fn trail_returns_newest_first_with_block_tags() {
        let blocks = sample_chain();
        let records = audit_trail(&blocks, &TrailFilter::default());
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].transaction.data["id"], 3);
        assert_eq!(records[0].block_index, 2);
        assert_eq!(records[0].block_hash, blocks[2].hash);
        assert_eq!(records[2].transaction.data["id"], 1);
    }

    #[test]
    fn trail_filters_by_type() {
        let blocks = sample_chain();
        let records = audit_trail(&blocks, &TrailFilter::for_type(RecordType::Trade));
        assert_eq!(records.len(), 2);
        assert!(records
            .iter()
            .all(|r| r.transaction.kind == RecordType::Trade));
    }

    #[test]
    fn trail_time_bounds_are_inclusive() {
        let blocks = sample_chain();
        let filter = TrailFilter {
            start_time: Some(at(2)),
            end_time: Some(at(3)),
            ..Default::default()
        };
        let records = audit_trail(&blocks, &filter);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].transaction.timestamp, at(3));
        assert_eq!(records[1].transaction.timestamp, at(2));
    }

    #[test]
    fn trail_respects_limit() {
        let blocks = sample_chain();
        let filter = TrailFilter {
            limit: 1,
            ..Default::default()
        };
        let records = audit_trail(&blocks, &filter);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction.data["id"], 3);
    }

    #[test]
    fn stats_count_types_and_report_validity() {
        let blocks = sample_chain();
        let stats = chain_stats(&blocks, 4);
        assert_eq!(stats.chain_length, 3);
        assert_eq!(stats.total_transactions, 3);
        assert_eq!(stats.transaction_types[&RecordType::Trade], 2);
        assert_eq!(stats.transaction_types[&RecordType::Order], 1);
        assert_eq!(stats.pending_transactions, 4);
        assert_eq!(stats.first_block_time, Some(blocks[0].timestamp));
        assert_eq!(stats.last_block_time, Some(blocks[2].timestamp));
        assert!(stats.is_valid);
    }

    #[test]
    fn stats_flag_tampered_chain_without_hiding_length() {
        let mut blocks = sample_chain();
        blocks[1].nonce = 42; // hash no longer matches
        let stats = chain_stats(&blocks, 0);
        assert!(!stats.is_valid);
        assert_eq!(stats.chain_length, 3);
    }

    #[test]
    fn stats_serialize_type_counts_as_string_keys() {
        let stats = chain_stats(&sample_chain(), 0);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["transaction_types"]["trade"], 2);
        assert_eq!(value["transaction_types"]["order"], 1);
    }
}
