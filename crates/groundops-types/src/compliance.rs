//! Compliance violation records and the aggregated compliance status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{DalLevel, OverallStatus, Severity};
use crate::ids::ViolationId;

/// A broken rule, recorded against the event that broke it.
///
/// Created only by the compliance validator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ComplianceViolation {
    /// Unique violation identifier.
    pub id: ViolationId,
    /// Wall-clock time (Unix ms) at which the violation was detected.
    pub timestamp: i64,
    /// Regulation code (e.g. `FAA-JO-7110.65-RWY`).
    pub regulation: String,
    /// Human-readable description.
    pub description: String,
    /// Violation severity.
    pub severity: Severity,
    /// Event that triggered the violation (a back-reference).
    pub event_id: String,
    /// Criticality tier of the triggering event.
    pub dal_level: DalLevel,
}

/// Aggregated compliance over a trailing time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ComplianceStatus {
    /// Overall verdict.
    pub overall_status: OverallStatus,
    /// Width of the trailing window in milliseconds.
    pub window_ms: u64,
    /// Violations inside the window.
    pub total_violations: usize,
    /// DAL A violations inside the window.
    pub level_a_violations: usize,
    /// DAL B violations inside the window.
    pub level_b_violations: usize,
    /// Critical-severity violations inside the window.
    pub critical_violations: usize,
    /// Violations inside the window, counted per regulation code.
    pub by_regulation: BTreeMap<String, usize>,
}

/// Outcome of checking one scenario compliance test case against history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct TestCaseResult {
    /// Test case identifier.
    pub test_case_id: String,
    /// Event the test case is about.
    pub event_id: String,
    /// Regulations the scenario expected.
    pub expected: Vec<String>,
    /// Regulations actually violated by the event.
    pub observed: Vec<String>,
    /// Whether expected and observed agree.
    pub passed: bool,
}
