//! Lifecycle and state-mutation notifications.
//!
//! The scheduler publishes every notification on a single channel as a
//! [`Notification`] value. UI collaborators subscribe to that channel and
//! switch on the `kind` tag.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::compliance::ComplianceViolation;
use crate::enums::SimulationEventType;
use crate::event::SimulationEventRecord;
use crate::world::WorldState;

/// A notification emitted by the scheduler, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum Notification {
    /// A scenario was loaded; the payload seeds external world mirrors.
    #[serde(rename_all = "camelCase")]
    ScenarioLoaded {
        /// Scenario identifier.
        scenario_id: String,
        /// Scenario display name.
        name: String,
        /// Number of events queued.
        event_count: usize,
        /// Initial world state.
        initial_state: WorldState,
    },
    /// A tick completed.
    #[serde(rename_all = "camelCase")]
    Tick {
        /// Simulation time (ms) after the tick.
        current_time: u64,
        /// Events still queued.
        queue_length: usize,
    },
    /// An event was injected into the queue.
    #[serde(rename_all = "camelCase")]
    EventInjected {
        /// The injected event.
        event: SimulationEventRecord,
        /// Queue length after insertion.
        queue_length: usize,
    },
    /// An event is about to be dispatched.
    #[serde(rename_all = "camelCase")]
    EventProcessing {
        /// Event identifier.
        event_id: String,
        /// Event kind.
        event_type: SimulationEventType,
    },
    /// An event finished dispatch and validation.
    #[serde(rename_all = "camelCase")]
    EventProcessed {
        /// Event identifier.
        event_id: String,
        /// Event kind.
        event_type: SimulationEventType,
        /// Wall-clock processing time in milliseconds.
        processing_time_ms: u64,
        /// Violations the event produced.
        violations: Vec<ComplianceViolation>,
    },
    /// A handler or rule failed while processing an event.
    #[serde(rename_all = "camelCase")]
    EventError {
        /// Event identifier.
        event_id: String,
        /// Name of the failing handler or rule.
        source: String,
        /// Failure message.
        message: String,
    },
    /// The time scale changed.
    #[serde(rename_all = "camelCase")]
    TimeScaleChanged {
        /// New (clamped) time scale.
        time_scale: f64,
    },
    /// The simulation started.
    #[serde(rename_all = "camelCase")]
    SimulationStarted {
        /// Simulation time (ms) at start.
        current_time: u64,
    },
    /// The simulation paused.
    #[serde(rename_all = "camelCase")]
    SimulationPaused {
        /// Simulation time (ms) frozen at pause.
        current_time: u64,
    },
    /// The simulation resumed.
    #[serde(rename_all = "camelCase")]
    SimulationResumed {
        /// Simulation time (ms) at resume.
        current_time: u64,
    },
    /// The simulation stopped.
    #[serde(rename_all = "camelCase")]
    SimulationStopped {
        /// Simulation time (ms) frozen at stop.
        current_time: u64,
    },
    /// The simulation was reset.
    #[serde(rename_all = "camelCase")]
    SimulationReset {
        /// Scenario reloaded by the reset, if any.
        scenario_id: Option<String>,
    },
    /// The dispatcher applied an event to world state. External mirrors
    /// apply the same transform to their own collections.
    #[serde(rename_all = "camelCase")]
    StateMutation {
        /// Event kind, for per-kind subscription.
        event_type: SimulationEventType,
        /// The applied event.
        event: SimulationEventRecord,
    },
}

impl Notification {
    /// Kebab-case name of the notification kind.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ScenarioLoaded { .. } => "scenario-loaded",
            Self::Tick { .. } => "tick",
            Self::EventInjected { .. } => "event-injected",
            Self::EventProcessing { .. } => "event-processing",
            Self::EventProcessed { .. } => "event-processed",
            Self::EventError { .. } => "event-error",
            Self::TimeScaleChanged { .. } => "time-scale-changed",
            Self::SimulationStarted { .. } => "simulation-started",
            Self::SimulationPaused { .. } => "simulation-paused",
            Self::SimulationResumed { .. } => "simulation-resumed",
            Self::SimulationStopped { .. } => "simulation-stopped",
            Self::SimulationReset { .. } => "simulation-reset",
            Self::StateMutation { .. } => "state-mutation",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_kind_tag() {
        let n = Notification::Tick {
            current_time: 1500,
            queue_length: 3,
        };
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["kind"], n.name());
        assert_eq!(value["payload"]["currentTime"], 1500);
        assert_eq!(value["payload"]["queueLength"], 3);
    }
}
