//! Scenario documents.
//!
//! A [`ScenarioConfig`] bundles an initial world snapshot with a timeline
//! of events. Scenarios are authored as JSON, loaded wholesale, and never
//! mutated afterwards: the scheduler derives its own queue from
//! [`ScenarioConfig::sorted_timeline`].

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::event::SimulationEvent;
use crate::world::WorldState;

/// A scenario's expectation about the compliance outcome of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceTestCase {
    /// Test case identifier.
    pub id: String,
    /// What the test case checks.
    #[serde(default)]
    pub description: String,
    /// Event the expectation is about.
    pub event_id: String,
    /// Regulations expected to be violated by that event. Empty means the
    /// event is expected to be clean.
    #[serde(default)]
    pub expected_regulations: Vec<String>,
}

/// Tunables a scenario may carry for the scheduler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemParameters {
    /// Time scale to apply when the scenario is loaded.
    #[serde(default)]
    pub time_scale: Option<f64>,
    /// Author-defined extras, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An authored scenario: initial world state plus an event timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioConfig {
    /// Scenario identifier used by `load_scenario`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// World state at time zero.
    #[serde(default)]
    pub initial_state: WorldState,
    /// Events in authored order (not necessarily sorted).
    #[serde(default)]
    pub timeline: Vec<SimulationEvent>,
    /// Expected compliance outcomes.
    #[serde(default)]
    pub compliance_test_cases: Vec<ComplianceTestCase>,
    /// Scheduler tunables.
    #[serde(default)]
    pub system_parameters: SystemParameters,
}

impl ScenarioConfig {
    /// Parse a scenario from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns the JSON error if the document is malformed or any event's
    /// parameters do not match its type.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// A fresh copy of the timeline, stable-sorted by timestamp.
    pub fn sorted_timeline(&self) -> VecDeque<SimulationEvent> {
        let mut events = self.timeline.clone();
        events.sort_by_key(|e| e.timestamp);
        events.into()
    }
}
