//! Single-entry action dispatch — `{action, …}` in, `{status, …}` out.
//!
//! The host hands the ledger untyped JSON; everything that can go wrong
//! (unknown action, malformed fields, bad timestamps) comes back as
//! `{"status": "error", "message": …}` so the trading loop stays up.

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use auditchain_core::{parse_timestamp, LedgerError, RecordType, TrailFilter, DEFAULT_TRAIL_LIMIT};

use crate::ledger::AuditLedger;

/// A request accepted by [`AuditLedger::execute`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    RecordTrade {
        #[serde(default)]
        trade_data: Value,
    },
    RecordOrder {
        #[serde(default)]
        order_data: Value,
    },
    RecordSystemChange {
        #[serde(default)]
        change_data: Value,
    },
    RecordLogin {
        #[serde(default)]
        user_data: Value,
    },
    RecordConfigChange {
        #[serde(default)]
        config_data: Value,
    },
    GetAuditTrail {
        record_type: Option<RecordType>,
        start_time: Option<String>,
        end_time: Option<String>,
        #[serde(default = "default_limit")]
        limit: usize,
    },
    VerifyIntegrity,
    GetStats,
    ForceMine,
}

fn default_limit() -> usize {
    DEFAULT_TRAIL_LIMIT
}

fn record_outcome(queued: bool) -> Value {
    if queued {
        json!({ "status": "success" })
    } else {
        json!({ "status": "error", "message": "record rejected" })
    }
}

fn error_outcome(e: &LedgerError) -> Value {
    json!({ "status": "error", "message": e.to_string() })
}

impl AuditLedger {
    /// Dispatch a `{action, …}` request and return a `{status, …}` result.
    pub async fn execute(&self, request: Value) -> Value {
        let action: Action = match serde_json::from_value(request) {
            Ok(action) => action,
            Err(e) => {
                warn!(error = %e, "rejected malformed action request");
                return json!({ "status": "error", "message": e.to_string() });
            }
        };
        self.dispatch(action).await
    }

    async fn dispatch(&self, action: Action) -> Value {
        match action {
            Action::RecordTrade { trade_data } => {
                record_outcome(self.record_trade(trade_data).await)
            }
            Action::RecordOrder { order_data } => {
                record_outcome(self.record_order(order_data).await)
            }
            Action::RecordSystemChange { change_data } => {
                record_outcome(self.record_system_change(change_data).await)
            }
            Action::RecordLogin { user_data } => {
                record_outcome(self.record_login(user_data).await)
            }
            Action::RecordConfigChange { config_data } => {
                record_outcome(self.record_config_change(config_data).await)
            }
            Action::GetAuditTrail {
                record_type,
                start_time,
                end_time,
                limit,
            } => {
                let mut filter = TrailFilter {
                    record_type,
                    limit,
                    ..Default::default()
                };
                match start_time.as_deref().map(parse_timestamp).transpose() {
                    Ok(start) => filter.start_time = start,
                    Err(e) => return error_outcome(&e),
                }
                match end_time.as_deref().map(parse_timestamp).transpose() {
                    Ok(end) => filter.end_time = end,
                    Err(e) => return error_outcome(&e),
                }
                let records = self.get_audit_trail(&filter).await;
                json!({ "status": "success", "records": records })
            }
            Action::VerifyIntegrity => {
                json!({ "status": "success", "is_valid": self.verify_chain_integrity().await })
            }
            Action::GetStats => {
                json!({ "status": "success", "stats": self.get_chain_stats().await })
            }
            Action::ForceMine => {
                json!({ "status": "success", "block": self.force_mine().await })
            }
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
