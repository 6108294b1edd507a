//! End-to-end ledger flows: record → mine → query, durability across
//! restarts, and lifecycle behavior.

use std::sync::Arc;

use serde_json::json;

use auditchain_core::{LedgerConfig, RecordType, TrailFilter};
use auditchain_plugin::AuditLedger;
use auditchain_storage::{MemoryStorage, SqliteStorage};

fn test_config() -> LedgerConfig {
    LedgerConfig {
        auto_mine: false,
        difficulty: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn record_mine_stats_scenario() {
    let ledger = AuditLedger::with_store(test_config(), None).await.unwrap();

    assert!(ledger.record_trade(json!({ "symbol": "BTC/USD", "qty": 1 })).await);
    assert!(ledger.record_order(json!({ "symbol": "ETH/USD", "side": "buy" })).await);
    assert!(ledger.record_trade(json!({ "symbol": "ETH/USD", "qty": 3 })).await);

    let block = ledger.force_mine().await.unwrap();
    assert_eq!(block.index, 1);
    let sealed = block.transactions();
    assert_eq!(sealed.len(), 3);
    assert_eq!(sealed[0].kind, RecordType::Trade);
    assert_eq!(sealed[1].kind, RecordType::Order);
    assert_eq!(sealed[2].kind, RecordType::Trade);

    let stats = ledger.get_chain_stats().await;
    assert_eq!(stats.chain_length, 2);
    assert_eq!(stats.total_transactions, 3);
    assert_eq!(stats.transaction_types[&RecordType::Trade], 2);
    assert_eq!(stats.transaction_types[&RecordType::Order], 1);
    assert_eq!(stats.pending_transactions, 0);
    assert!(stats.is_valid);
}

#[tokio::test]
async fn force_mine_on_empty_queue_returns_none() {
    let ledger = AuditLedger::with_store(test_config(), None).await.unwrap();
    assert!(ledger.force_mine().await.is_none());
    assert_eq!(ledger.get_chain_stats().await.chain_length, 1);
}

#[tokio::test]
async fn disabled_record_type_is_rejected_without_queuing() {
    let config = LedgerConfig {
        record_types: vec![RecordType::Trade],
        ..test_config()
    };
    let ledger = AuditLedger::with_store(config, None).await.unwrap();

    assert!(!ledger.record_login(json!({ "user": "ops" })).await);
    assert!(ledger.record_trade(json!({ "symbol": "BTC/USD" })).await);

    let stats = ledger.get_chain_stats().await;
    assert_eq!(stats.pending_transactions, 1);
}

#[tokio::test]
async fn audit_trail_filters_and_orders_newest_first() {
    let ledger = AuditLedger::with_store(test_config(), None).await.unwrap();

    for i in 0..5 {
        assert!(ledger.record_trade(json!({ "seq": i })).await);
        assert!(ledger.record_login(json!({ "seq": i })).await);
    }
    ledger.force_mine().await.unwrap();

    let trades = ledger
        .get_audit_trail(&TrailFilter::for_type(RecordType::Trade))
        .await;
    assert_eq!(trades.len(), 5);
    assert!(trades
        .iter()
        .all(|r| r.transaction.kind == RecordType::Trade));
    for pair in trades.windows(2) {
        assert!(pair[0].transaction.timestamp >= pair[1].transaction.timestamp);
    }

    let limited = ledger
        .get_audit_trail(&TrailFilter {
            limit: 3,
            ..Default::default()
        })
        .await;
    assert_eq!(limited.len(), 3);
}

#[tokio::test]
async fn trail_records_carry_containing_block() {
    let ledger = AuditLedger::with_store(test_config(), None).await.unwrap();
    assert!(ledger.record_trade(json!({ "seq": 1 })).await);
    let first = ledger.force_mine().await.unwrap();
    assert!(ledger.record_trade(json!({ "seq": 2 })).await);
    let second = ledger.force_mine().await.unwrap();

    let records = ledger.get_audit_trail(&TrailFilter::default()).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].block_index, second.index);
    assert_eq!(records[0].block_hash, second.hash);
    assert_eq!(records[1].block_index, first.index);
    assert_eq!(records[1].block_hash, first.hash);
}

#[tokio::test]
async fn memory_store_mirrors_chain_and_queue() {
    let store = Arc::new(MemoryStorage::new());
    let ledger = AuditLedger::with_store(test_config(), Some(store.clone()))
        .await
        .unwrap();

    assert_eq!(store.block_count(), 1); // genesis persisted on open
    assert!(ledger.record_trade(json!({ "symbol": "BTC/USD" })).await);
    assert_eq!(store.pending_count(), 1);

    ledger.force_mine().await.unwrap();
    assert_eq!(store.block_count(), 2);
    assert_eq!(store.pending_count(), 0);
}

#[tokio::test]
async fn sqlite_restart_reproduces_chain_and_pending_queue() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit_chain.db");
    let path = path.to_str().unwrap();

    // First run: two sealed blocks plus one still-pending transaction.
    {
        let store = Arc::new(SqliteStorage::open(path).await.unwrap());
        let ledger = AuditLedger::with_store(test_config(), Some(store))
            .await
            .unwrap();
        assert!(ledger.record_trade(json!({ "seq": 1 })).await);
        ledger.force_mine().await.unwrap();
        assert!(ledger.record_order(json!({ "seq": 2 })).await);
        ledger.force_mine().await.unwrap();
        assert!(ledger.record_login(json!({ "seq": 3 })).await);
    }

    // Restart against the same file.
    let store = Arc::new(SqliteStorage::open(path).await.unwrap());
    let ledger = AuditLedger::with_store(test_config(), Some(store))
        .await
        .unwrap();

    let stats = ledger.get_chain_stats().await;
    assert_eq!(stats.chain_length, 3);
    assert_eq!(stats.total_transactions, 2);
    assert_eq!(stats.pending_transactions, 1);
    assert!(stats.is_valid);
    assert!(ledger.verify_chain_integrity().await);

    // The reloaded queue seals exactly the carried-over transaction.
    let block = ledger.force_mine().await.unwrap();
    assert_eq!(block.index, 3);
    assert_eq!(block.transactions().len(), 1);
    assert_eq!(block.transactions()[0].kind, RecordType::Login);
}

#[tokio::test]
async fn restart_preserves_block_hashes_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit_chain.db");
    let path = path.to_str().unwrap();

    let original_hash = {
        let store = Arc::new(SqliteStorage::open(path).await.unwrap());
        let ledger = AuditLedger::with_store(test_config(), Some(store))
            .await
            .unwrap();
        assert!(ledger.record_trade(json!({ "symbol": "BTC/USD" })).await);
        ledger.force_mine().await.unwrap().hash
    };

    let store = Arc::new(SqliteStorage::open(path).await.unwrap());
    let ledger = AuditLedger::with_store(test_config(), Some(store))
        .await
        .unwrap();
    let reloaded = ledger.get_block(1).await.unwrap();
    assert_eq!(reloaded.hash, original_hash);
    assert_eq!(ledger.get_block_by_hash(&original_hash).await.unwrap().index, 1);
}

#[tokio::test]
async fn shutdown_flushes_pending_and_is_terminal() {
    let ledger = AuditLedger::with_store(test_config(), None).await.unwrap();
    assert!(ledger.record_trade(json!({ "symbol": "BTC/USD" })).await);

    assert!(ledger.shutdown().await);
    assert!(ledger.is_shut_down());

    // The final flush sealed the queued transaction.
    let stats = ledger.get_chain_stats().await;
    assert_eq!(stats.chain_length, 2);
    assert_eq!(stats.pending_transactions, 0);

    // Producers are rejected after shutdown; reads stay available.
    assert!(!ledger.record_trade(json!({ "symbol": "ETH/USD" })).await);
    assert!(ledger.verify_chain_integrity().await);

    // Idempotent.
    assert!(ledger.shutdown().await);
}

#[tokio::test]
async fn auto_miner_runs_and_shutdown_stops_it() {
    let config = LedgerConfig {
        auto_mine: true,
        mining_interval_secs: 1,
        difficulty: 1,
        ..Default::default()
    };
    let ledger = AuditLedger::with_store(config, None).await.unwrap();
    assert!(ledger.record_trade(json!({ "symbol": "BTC/USD" })).await);

    // Shutdown stops the miner and flushes whatever the loop hadn't sealed.
    assert!(ledger.shutdown().await);
    let stats = ledger.get_chain_stats().await;
    assert_eq!(stats.pending_transactions, 0);
    assert_eq!(stats.total_transactions, 1);
}
