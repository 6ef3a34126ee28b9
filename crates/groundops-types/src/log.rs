//! Audit log entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::enums::{DalLevel, LogType};
use crate::ids::LogId;

/// One entry in the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SimulationLog {
    /// Unique entry identifier.
    pub id: LogId,
    /// Wall-clock time (Unix ms) of the entry.
    pub timestamp: i64,
    /// Event the entry refers to, if any.
    #[serde(default)]
    pub event_id: Option<String>,
    /// Entry kind.
    #[serde(rename = "type")]
    pub log_type: LogType,
    /// Free-form payload.
    pub data: Value,
    /// Criticality tier of the related event, if any.
    #[serde(default)]
    pub dal_level: Option<DalLevel>,
}
