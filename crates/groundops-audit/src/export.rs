//! Summary statistics and export formats for the audit log.
//!
//! Three export formats are supported:
//!
//! - **CSV**: one row per entry with `timestamp,type,eventId,dalLevel,data`.
//! - **JSON**: `{exportedAt, summary, logs}` over every retained entry.
//! - **Audit**: a restricted subset (DAL A entries plus every compliance and
//!   error entry), each paired with an FNV-1a checksum of its serialized form.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use groundops_types::{DalLevel, LogType, SimulationLog};
use serde::Serialize;
use serde_json::Value;

use crate::error::AuditError;
use crate::store::AuditLog;

/// Criteria label written into audit exports.
pub const AUDIT_CRITERIA: &str = "dal-a, compliance, error";

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Aggregate counts over the retained entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSummary {
    /// Retained entries.
    pub total_entries: usize,
    /// Entries evicted by the retention cap.
    pub evicted_entries: u64,
    /// Entry counts keyed by log type.
    pub by_type: BTreeMap<String, usize>,
    /// Entry counts keyed by DAL level (`none` for entries without one).
    pub by_dal_level: BTreeMap<String, usize>,
    /// Number of `error` entries.
    pub error_count: usize,
    /// Number of `compliance` entries.
    pub violation_count: usize,
    /// Mean `processingTimeMs` over `response` entries, 0 if there are none.
    pub average_response_time_ms: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonExport<'a> {
    exported_at: String,
    summary: LogSummary,
    logs: Vec<&'a SimulationLog>,
}

#[derive(Serialize)]
struct AuditRecord<'a> {
    entry: &'a SimulationLog,
    checksum: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuditExport<'a> {
    exported_at: String,
    criteria: &'static str,
    record_count: usize,
    records: Vec<AuditRecord<'a>>,
}

/// 32-bit FNV-1a hash of `bytes`.
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Checksum of one entry as eight lowercase hex digits.
///
/// # Errors
///
/// Returns [`AuditError::Json`] if the entry cannot be serialized.
pub fn entry_checksum(entry: &SimulationLog) -> Result<String, AuditError> {
    let bytes = serde_json::to_vec(entry)?;
    Ok(format!("{:08x}", fnv1a_32(&bytes)))
}

fn is_audit_relevant(entry: &SimulationLog) -> bool {
    entry.dal_level == Some(DalLevel::A)
        || matches!(entry.log_type, LogType::Compliance | LogType::Error)
}

fn format_timestamp(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map_or_else(|| ms.to_string(), |dt| dt.to_rfc3339())
}

#[allow(clippy::cast_precision_loss)]
fn mean(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

impl AuditLog {
    /// Aggregate counts over the retained entries.
    pub fn summary(&self) -> LogSummary {
        let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
        let mut by_dal_level: BTreeMap<String, usize> = BTreeMap::new();
        let mut response_total = 0.0_f64;
        let mut response_count = 0_usize;

        for entry in self.entries() {
            let slot = by_type.entry(entry.log_type.as_str().to_owned()).or_insert(0);
            *slot = slot.saturating_add(1);
            let dal = entry.dal_level.map_or("none", DalLevel::as_str);
            let slot = by_dal_level.entry(dal.to_owned()).or_insert(0);
            *slot = slot.saturating_add(1);

            if entry.log_type != LogType::Response {
                continue;
            }
            if let Some(ms) = entry.data.get("processingTimeMs").and_then(Value::as_f64) {
                response_total += ms;
                response_count = response_count.saturating_add(1);
            }
        }

        LogSummary {
            total_entries: self.len(),
            evicted_entries: self.evicted(),
            error_count: by_type.get(LogType::Error.as_str()).copied().unwrap_or(0),
            violation_count: by_type.get(LogType::Compliance.as_str()).copied().unwrap_or(0),
            by_type,
            by_dal_level,
            average_response_time_ms: mean(response_total, response_count),
        }
    }

    /// Export every retained entry as CSV.
    ///
    /// # Errors
    ///
    /// Returns an [`AuditError`] if a row cannot be written or the payload
    /// cannot be serialized.
    pub fn export_csv(&self) -> Result<String, AuditError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["timestamp", "type", "eventId", "dalLevel", "data"])?;
        for entry in self.entries() {
            let data = serde_json::to_string(&entry.data)?;
            writer.write_record([
                format_timestamp(entry.timestamp).as_str(),
                entry.log_type.as_str(),
                entry.event_id.as_deref().unwrap_or(""),
                entry.dal_level.map_or("", DalLevel::as_str),
                data.as_str(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| AuditError::Flush(e.error().to_string()))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Export every retained entry, with summary, as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Json`] if serialization fails.
    pub fn export_json(&self) -> Result<String, AuditError> {
        let export = JsonExport {
            exported_at: Utc::now().to_rfc3339(),
            summary: self.summary(),
            logs: self.entries().collect(),
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Export the audit subset with a checksum per record.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Json`] if serialization fails.
    pub fn export_audit(&self) -> Result<String, AuditError> {
        let records = self
            .entries()
            .filter(|e| is_audit_relevant(e))
            .map(|entry| {
                Ok(AuditRecord {
                    entry,
                    checksum: entry_checksum(entry)?,
                })
            })
            .collect::<Result<Vec<_>, AuditError>>()?;
        let export = AuditExport {
            exported_at: Utc::now().to_rfc3339(),
            criteria: AUDIT_CRITERIA,
            record_count: records.len(),
            records,
        };
        Ok(serde_json::to_string_pretty(&export)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use groundops_types::{EventPayload, FlightGrounded, SimulationEvent};
    use serde_json::json;

    use super::*;
    use crate::store::ResponseDetails;

    fn populated() -> AuditLog {
        let mut log = AuditLog::default();
        let event = SimulationEvent::new(
            "evt-1",
            1_000,
            EventPayload::FlightGrounded(FlightGrounded {
                aircraft_id: String::from("DAL456"),
                reason: String::from("hydraulics, \"left\" system"),
            }),
        )
        .with_dal_level(DalLevel::A);
        log.record_event(&event, 1_700_000_000_000);
        for ms in [20, 40] {
            log.record_response(
                &event,
                &ResponseDetails {
                    processing_time_ms: ms,
                    simulation_time: 1_000,
                    handlers_run: 1,
                    handler_failures: 0,
                    violation_count: 0,
                },
                1_700_000_000_001,
            );
        }
        log.record_error(None, None, "rule", "lookup failed", 1_700_000_000_002);
        log.record_performance("tick", json!(5), 1_700_000_000_003);
        log
    }

    #[test]
    fn fnv1a_matches_reference_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9c_f968);
    }

    #[test]
    fn summary_counts_and_averages() {
        let summary = populated().summary();
        assert_eq!(summary.total_entries, 5);
        assert_eq!(summary.by_type.get("response"), Some(&2));
        assert_eq!(summary.by_dal_level.get("A"), Some(&3));
        assert_eq!(summary.by_dal_level.get("none"), Some(&2));
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.violation_count, 0);
        assert!((summary.average_response_time_ms - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn csv_export_has_header_and_quoted_payloads() {
        let csv = populated().export_csv().unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["timestamp", "type", "eventId", "dalLevel", "data"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 5);
        let first = rows.first().unwrap();
        assert_eq!(first.get(1), Some("event"));
        assert_eq!(first.get(3), Some("A"));
        let data: Value = serde_json::from_str(first.get(4).unwrap()).unwrap();
        assert_eq!(data["parameters"]["reason"], "hydraulics, \"left\" system");
    }

    #[test]
    fn json_export_includes_summary() {
        let json: Value = serde_json::from_str(&populated().export_json().unwrap()).unwrap();
        assert_eq!(json["logs"].as_array().map(Vec::len), Some(5));
        assert_eq!(json["summary"]["totalEntries"], 5);
        assert!(json["exportedAt"].is_string());
    }

    #[test]
    fn audit_export_is_restricted_and_checksummed() {
        let log = populated();
        let json: Value = serde_json::from_str(&log.export_audit().unwrap()).unwrap();
        // Three DAL A entries plus the error; the performance entry is excluded.
        assert_eq!(json["recordCount"], 4);
        let records = json["records"].as_array().unwrap();
        for record in records {
            let entry: SimulationLog = serde_json::from_value(record["entry"].clone()).unwrap();
            assert_eq!(record["checksum"], entry_checksum(&entry).unwrap());
            assert_ne!(entry.log_type, LogType::Performance);
        }
    }
}
