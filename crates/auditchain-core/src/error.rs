//! Error types for the audit ledger.

use thiserror::Error;

/// Errors that can occur while operating the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    #[error("ledger has been shut down")]
    ShutDown,

    #[error("{0}")]
    Other(String),
}

impl LedgerError {
    /// Returns `true` if the error came from the durable store.
    ///
    /// Storage failures are non-fatal for a running ledger: the in-memory
    /// chain stays authoritative and the caller only loses durability.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
