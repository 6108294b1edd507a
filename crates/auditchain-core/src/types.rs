//! Shared types for the audit ledger.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

// ─── RecordType ──────────────────────────────────────────────────────────────

/// The category of an audited event.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Trade,
    Order,
    SystemChange,
    Login,
    ConfigChange,
}

impl RecordType {
    /// Every record type, in the order the default configuration enables them.
    pub const ALL: [RecordType; 5] = [
        RecordType::Trade,
        RecordType::Order,
        RecordType::SystemChange,
        RecordType::Login,
        RecordType::ConfigChange,
    ];

    /// Wire name of the record type (`"trade"`, `"system_change"`, …).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::Order => "order",
            Self::SystemChange => "system_change",
            Self::Login => "login",
            Self::ConfigChange => "config_change",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecordType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LedgerError::Other(format!("unknown record type: {s}")))
    }
}

// ─── Transaction ─────────────────────────────────────────────────────────────

/// A single audited event, pending until sealed into a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The event category.
    #[serde(rename = "type")]
    pub kind: RecordType,
    /// Opaque domain payload supplied by the host (trade fill, order, …).
    pub data: serde_json::Value,
    /// Submission time, assigned by the ledger when the host omits it.
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Create a transaction stamped with the current time.
    pub fn new(kind: RecordType, data: serde_json::Value) -> Self {
        Self {
            kind,
            data,
            timestamp: Utc::now(),
        }
    }

    /// Create a transaction with an explicit timestamp.
    pub fn with_timestamp(
        kind: RecordType,
        data: serde_json::Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            data,
            timestamp,
        }
    }
}

// ─── AuditRecord ─────────────────────────────────────────────────────────────

/// A sealed transaction tagged with the block that contains it.
///
/// The unit returned by the audit trail and embedded in detailed reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Index of the containing block.
    pub block_index: u64,
    /// Hash of the containing block.
    pub block_hash: String,
}

// ─── Timestamp parsing ───────────────────────────────────────────────────────

/// Parse a caller-supplied timestamp leniently.
///
/// Accepts RFC 3339 (`2023-01-01T12:00:00Z`, with offset), naive ISO 8601
/// (`2023-01-01T12:00:00`, interpreted as UTC), and bare dates
/// (`2023-01-01`, midnight UTC).
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, LedgerError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(LedgerError::InvalidTimestamp {
        value: value.to_string(),
        reason: "expected an ISO 8601 date or datetime".to_string(),
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
