//! Audit report generation over filtered trail records.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::types::{AuditRecord, RecordType};

/// How many raw transactions a detailed report embeds before truncating.
pub const DETAILED_REPORT_LIMIT: usize = 100;

/// Report flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Counts and time range only.
    Summary,
    /// Summary plus per-day buckets and embedded transactions.
    Detailed,
}

impl std::str::FromStr for ReportKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "summary" => Ok(Self::Summary),
            "detailed" => Ok(Self::Detailed),
            other => Err(LedgerError::Other(format!("unknown report type: {other}"))),
        }
    }
}

/// Inclusive time span covered by a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A generated audit report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub report_type: ReportKind,
    pub generated_at: DateTime<Utc>,
    pub transaction_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub transaction_types: BTreeMap<RecordType, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_range: Option<TimeRange>,
    /// Detailed only: transaction counts per calendar day.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_counts: Option<BTreeMap<NaiveDate, usize>>,
    /// Detailed only: up to [`DETAILED_REPORT_LIMIT`] raw transactions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<AuditRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Generate an audit report from trail records.
///
/// An empty input yields a zero-count report rather than an error, so
/// report generation is always available for forensic workflows.
pub fn generate_audit_report(records: &[AuditRecord], kind: ReportKind) -> AuditReport {
    if records.is_empty() {
        return AuditReport {
            report_type: kind,
            generated_at: Utc::now(),
            transaction_count: 0,
            message: Some("no transactions found".to_string()),
            transaction_types: BTreeMap::new(),
            time_range: None,
            daily_counts: None,
            transactions: None,
            note: None,
        };
    }

    let mut transaction_types = BTreeMap::new();
    for record in records {
        *transaction_types.entry(record.transaction.kind).or_insert(0) += 1;
    }

    let timestamps = records.iter().map(|r| r.transaction.timestamp);
    let time_range = Some(TimeRange {
        start: timestamps.clone().min().unwrap_or_else(Utc::now),
        end: timestamps.max().unwrap_or_else(Utc::now),
    });

    let mut report = AuditReport {
        report_type: kind,
        generated_at: Utc::now(),
        transaction_count: records.len(),
        message: None,
        transaction_types,
        time_range,
        daily_counts: None,
        transactions: None,
        note: None,
    };

    if kind == ReportKind::Detailed {
        let mut daily_counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for record in records {
            *daily_counts
                .entry(record.transaction.timestamp.date_naive())
                .or_insert(0) += 1;
        }
        report.daily_counts = Some(daily_counts);
        report.transactions = Some(records.iter().take(DETAILED_REPORT_LIMIT).cloned().collect());
        if records.len() > DETAILED_REPORT_LIMIT {
            report.note = Some(format!(
                "showing {} of {} transactions",
                DETAILED_REPORT_LIMIT,
                records.len()
            ));
        }
    }

    report
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transaction;
    use chrono::TimeZone;

    fn record(kind: RecordType, day: u32, hour: u32) -> AuditRecord {
        AuditRecord {
            transaction: Transaction::with_timestamp(
                kind,
                serde_json::json!({}),
                Utc.with_ymd_and_hms(2023, 1, day, hour, 0, 0).unwrap(),
            ),
            block_index: 1,
            block_hash: "00abc".to_string(),
        }
    }

    #[test]
    fn summary_report_counts_and_time_range() {
        let records = vec![
            record(RecordType::Trade, 1, 12),
            record(RecordType::Trade, 2, 13),
            record(RecordType::Order, 1, 14),
        ];
        let report = generate_audit_report(&records, ReportKind::Summary);
        assert_eq!(report.transaction_count, 3);
        assert_eq!(report.transaction_types[&RecordType::Trade], 2);
        assert_eq!(report.transaction_types[&RecordType::Order], 1);
        let range = report.time_range.unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap());
        assert_eq!(range.end, Utc.with_ymd_and_hms(2023, 1, 2, 13, 0, 0).unwrap());
        assert!(report.daily_counts.is_none());
        assert!(report.transactions.is_none());
    }

    #[test]
    fn detailed_report_buckets_per_day() {
        let records = vec![
            record(RecordType::Trade, 1, 12),
            record(RecordType::Order, 1, 14),
            record(RecordType::Trade, 2, 13),
        ];
        let report = generate_audit_report(&records, ReportKind::Detailed);
        let daily = report.daily_counts.unwrap();
        assert_eq!(daily[&NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()], 2);
        assert_eq!(daily[&NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()], 1);
        assert_eq!(report.transactions.unwrap().len(), 3);
        assert!(report.note.is_none());
    }

    #[test]
    fn detailed_report_truncates_with_note() {
        let records: Vec<AuditRecord> = (0..150)
            .map(|_| record(RecordType::Login, 1, 1))
            .collect();
        let report = generate_audit_report(&records, ReportKind::Detailed);
        assert_eq!(report.transaction_count, 150);
        assert_eq!(report.transactions.unwrap().len(), DETAILED_REPORT_LIMIT);
        assert_eq!(report.note.unwrap(), "showing 100 of 150 transactions");
    }

    #[test]
    fn empty_input_yields_zero_count_report() {
        let report = generate_audit_report(&[], ReportKind::Summary);
        assert_eq!(report.transaction_count, 0);
        assert_eq!(report.message.unwrap(), "no transactions found");
        assert!(report.time_range.is_none());
    }

    #[test]
    fn report_kind_parses_from_cli_strings() {
        assert_eq!("summary".parse::<ReportKind>().unwrap(), ReportKind::Summary);
        assert_eq!("detailed".parse::<ReportKind>().unwrap(), ReportKind::Detailed);
        assert!("weekly".parse::<ReportKind>().is_err());
    }
}
