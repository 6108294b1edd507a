//! auditchain-plugin — lifecycle facade and action dispatch for embedding
//! the audit ledger in a host trading system.
//!
//! The host composes an [`AuditLedger`] at startup, calls `record_*` from its
//! trading loop, and the background miner periodically seals the queue:
//!
//! ```text
//! host record_* ──► ChainStore pending queue ──► MinerHandle (every interval)
//!                                                    └── mine_pending() → Block
//! execute({action, …}) ──► record / query / verify / force_mine dispatch
//! ```
//!
//! The host never sees blocks, hashing, or mining — only booleans from the
//! producer surface and `{status, …}` values from [`AuditLedger::execute`].

pub mod action;
pub mod ledger;
pub mod miner;

pub use action::Action;
pub use ledger::AuditLedger;
pub use miner::MinerHandle;
