//! Ledger configuration.
//!
//! An explicit configuration struct passed to the facade at startup — no
//! process-wide state.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::RecordType;

/// Configuration for one audit ledger instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Master switch; a disabled ledger rejects every record.
    pub enabled: bool,
    /// Seconds between background mining attempts.
    pub mining_interval_secs: u64,
    /// Leading-zero count required of a sealed block's hash.
    ///
    /// Keep small (1–4): expected mining cost grows as `16^difficulty` and
    /// nothing preempts a search that overruns `mining_interval_secs`.
    pub difficulty: usize,
    /// SQLite file backing the ledger; `None` = in-memory only.
    pub db_path: Option<PathBuf>,
    /// Spawn the background miner at initialization.
    pub auto_mine: bool,
    /// Record types accepted by the producer surface.
    pub record_types: Vec<RecordType>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mining_interval_secs: 300,
            difficulty: 2,
            db_path: None,
            auto_mine: true,
            record_types: RecordType::ALL.to_vec(),
        }
    }
}

impl LedgerConfig {
    /// Returns `true` if events of `kind` should be recorded.
    pub fn records(&self, kind: RecordType) -> bool {
        self.enabled && self.record_types.contains(&kind)
    }

    /// The background miner's wait between sealing attempts.
    pub fn mining_interval(&self) -> Duration {
        Duration::from_secs(self.mining_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_enables_all_record_types() {
        let config = LedgerConfig::default();
        for kind in RecordType::ALL {
            assert!(config.records(kind));
        }
        assert_eq!(config.mining_interval(), Duration::from_secs(300));
        assert_eq!(config.difficulty, 2);
    }

    #[test]
    fn disabled_ledger_records_nothing() {
        let config = LedgerConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(!config.records(RecordType::Trade));
    }

    #[test]
    fn record_types_filter_applies() {
        let config = LedgerConfig {
            record_types: vec![RecordType::Trade, RecordType::Order],
            ..Default::default()
        };
        assert!(config.records(RecordType::Order));
        assert!(!config.records(RecordType::Login));
    }
}
