//! Scheduler status snapshot.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle state of the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum RunState {
    /// Not ticking; simulation time is frozen.
    #[default]
    Stopped,
    /// Ticking.
    Running,
    /// Temporarily halted; resumes from the frozen time.
    Paused,
}

/// Point-in-time view of the scheduler, served to observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SimulationStatus {
    /// Lifecycle state.
    pub state: RunState,
    /// Simulation time in milliseconds.
    pub current_time: u64,
    /// Simulated milliseconds per wall-clock millisecond.
    pub time_scale: f64,
    /// Events still queued.
    pub queue_length: usize,
    /// Timestamp of the next queued event.
    pub next_event_time: Option<u64>,
    /// Scenario currently loaded.
    pub active_scenario: Option<String>,
    /// Events processed since the last reset.
    pub events_processed: u64,
}
