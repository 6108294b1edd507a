//! auditchain-core — foundation of the hash-chained trading audit ledger.
//!
//! # Architecture
//!
//! ```text
//! AuditLedger (facade) → ChainStore
//!                            ├── Vec<Block>        (sealed chain, genesis first)
//!                            ├── Vec<Transaction>  (pending queue)
//!                            └── dyn LedgerStore   (memory / SQLite backend)
//!
//! query::audit_trail / query::chain_stats / report::generate_audit_report
//! read from chain snapshots only.
//! ```

pub mod block;
pub mod chain;
pub mod config;
pub mod error;
pub mod query;
pub mod report;
pub mod store;
pub mod types;

pub use block::{Block, BlockPayload, GENESIS_PREVIOUS_HASH};
pub use chain::{validate_blocks, ChainStore};
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use query::{audit_trail, chain_stats, ChainStats, TrailFilter, DEFAULT_TRAIL_LIMIT};
pub use report::{generate_audit_report, AuditReport, ReportKind};
pub use store::LedgerStore;
pub use types::{parse_timestamp, AuditRecord, RecordType, Transaction};
