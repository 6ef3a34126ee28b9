//! The bounded, append-only audit log.
//!
//! Entries are kept oldest-first in a ring. Once the configured cap is
//! exceeded the oldest entries are evicted so the log holds exactly the most
//! recent `max_entries`. This is a best-effort in-memory trail, not a
//! persistent store.

use std::collections::VecDeque;

use groundops_types::{
    ComplianceViolation, DalLevel, LogId, LogType, SimulationEvent, SimulationLog,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::trace;

/// Default retention cap.
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// Retention settings for the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Maximum number of entries retained (default: 10 000).
    pub max_entries: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Dispatch outcome recorded in a `response` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseDetails {
    /// Wall-clock processing time in milliseconds.
    pub processing_time_ms: u64,
    /// Simulation time (ms) at which the event was processed.
    pub simulation_time: u64,
    /// Handlers that ran for the event.
    pub handlers_run: usize,
    /// Handlers that failed.
    pub handler_failures: usize,
    /// Violations the event produced.
    pub violation_count: usize,
}

/// Append-only audit trail with FIFO eviction.
#[derive(Debug, Clone)]
pub struct AuditLog {
    /// Retained entries, oldest first.
    entries: VecDeque<SimulationLog>,
    /// Retention cap.
    max_entries: usize,
    /// Entries evicted since construction.
    evicted: u64,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

impl AuditLog {
    /// Create an empty log with the given retention settings.
    ///
    /// A cap of zero is raised to one so the most recent entry is always
    /// visible.
    pub fn new(config: AuditConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            max_entries: config.max_entries.max(1),
            evicted: 0,
        }
    }

    /// Append a fully-formed entry and enforce the retention cap.
    pub fn push(&mut self, entry: SimulationLog) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            if self.entries.pop_front().is_some() {
                self.evicted = self.evicted.saturating_add(1);
            }
        }
    }

    /// Build and append an entry, returning its id.
    pub fn append(
        &mut self,
        log_type: LogType,
        event_id: Option<&str>,
        dal_level: Option<DalLevel>,
        data: Value,
        timestamp: i64,
    ) -> LogId {
        let id = LogId::new();
        trace!(%id, log_type = log_type.as_str(), ?event_id, "Audit entry appended");
        self.push(SimulationLog {
            id,
            timestamp,
            event_id: event_id.map(str::to_owned),
            log_type,
            data,
            dal_level,
        });
        id
    }

    /// Record an event entering processing.
    pub fn record_event(&mut self, event: &SimulationEvent, timestamp: i64) -> LogId {
        let data = json!({
            "eventType": event.event_type(),
            "simulationTime": event.timestamp,
            "priority": event.priority,
            "parameters": event.payload.to_parameters(),
            "loggingRequirements": event.logging_requirements,
            "expectedComplianceResponse": event.expected_compliance_response,
        });
        self.append(
            LogType::Event,
            Some(&event.id),
            Some(event.dal_level),
            data,
            timestamp,
        )
    }

    /// Record the dispatcher's response to an event.
    pub fn record_response(
        &mut self,
        event: &SimulationEvent,
        details: &ResponseDetails,
        timestamp: i64,
    ) -> LogId {
        let data = json!({
            "eventType": event.event_type(),
            "processingTimeMs": details.processing_time_ms,
            "simulationTime": details.simulation_time,
            "handlersRun": details.handlers_run,
            "handlerFailures": details.handler_failures,
            "violationCount": details.violation_count,
        });
        self.append(
            LogType::Response,
            Some(&event.id),
            Some(event.dal_level),
            data,
            timestamp,
        )
    }

    /// Record a compliance violation.
    pub fn record_violation(&mut self, violation: &ComplianceViolation) -> LogId {
        let data = json!({
            "violationId": violation.id,
            "regulation": violation.regulation,
            "description": violation.description,
            "severity": violation.severity,
        });
        self.append(
            LogType::Compliance,
            Some(&violation.event_id),
            Some(violation.dal_level),
            data,
            violation.timestamp,
        )
    }

    /// Record an internal failure (handler or rule error).
    pub fn record_error(
        &mut self,
        event_id: Option<&str>,
        dal_level: Option<DalLevel>,
        source: &str,
        message: &str,
        timestamp: i64,
    ) -> LogId {
        let data = json!({
            "source": source,
            "message": message,
        });
        self.append(LogType::Error, event_id, dal_level, data, timestamp)
    }

    /// Record a performance measurement.
    pub fn record_performance(&mut self, metric: &str, value: Value, timestamp: i64) -> LogId {
        let data = json!({
            "metric": metric,
            "value": value,
        });
        self.append(LogType::Performance, None, None, data, timestamp)
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &SimulationLog> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retention cap.
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Entries evicted since construction.
    pub const fn evicted(&self) -> u64 {
        self.evicted
    }

    /// The `limit` most recent entries, newest first.
    pub fn recent(&self, limit: usize) -> Vec<SimulationLog> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    /// Entries of one kind, oldest first.
    pub fn by_type(&self, log_type: LogType) -> Vec<SimulationLog> {
        self.entries
            .iter()
            .filter(|e| e.log_type == log_type)
            .cloned()
            .collect()
    }

    /// Entries about one event, oldest first.
    pub fn by_event(&self, event_id: &str) -> Vec<SimulationLog> {
        self.entries
            .iter()
            .filter(|e| e.event_id.as_deref() == Some(event_id))
            .cloned()
            .collect()
    }
}
