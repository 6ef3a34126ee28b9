//! Scripted simulation events.
//!
//! Scenario authors write events as `{id, timestamp, type, parameters, ...}`
//! JSON objects. Inside the core an event carries an [`EventPayload`]: a
//! tagged union with one typed parameter struct per [`SimulationEventType`].
//! The conversion between the two happens through [`SimulationEventRecord`],
//! so a malformed parameter block is rejected when the scenario is loaded
//! rather than when the event fires.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::enums::{
    AircraftStatus, DalLevel, Priority, RunwayStatus, Severity, SimulationEventType,
};
use crate::world::Position;

/// Default outage duration for a communication failure (5 minutes).
pub const DEFAULT_COMMUNICATION_OUTAGE_MS: u64 = 300_000;

/// Error raised when an event's parameter block does not match its type.
#[derive(Debug, thiserror::Error)]
#[error("invalid parameters for {event_type} event {event_id}: {source}")]
pub struct EventParseError {
    /// Identifier of the offending event.
    pub event_id: String,
    /// Declared event type.
    pub event_type: SimulationEventType,
    /// The underlying JSON error.
    pub source: serde_json::Error,
}

// ---------------------------------------------------------------------------
// Typed parameter blocks
// ---------------------------------------------------------------------------

/// Parameters of an aircraft-movement event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AircraftMovement {
    /// Aircraft id or callsign.
    #[serde(alias = "callsign")]
    pub aircraft_id: String,
    /// New position, if it changes.
    #[serde(default)]
    pub position: Option<Position>,
    /// New status, if it changes.
    #[serde(default)]
    pub status: Option<AircraftStatus>,
    /// Runway the aircraft moves onto.
    #[serde(default)]
    pub runway: Option<String>,
    /// Gate the aircraft moves to.
    #[serde(default)]
    pub gate: Option<String>,
}

/// Parameters of a vehicle-dispatch event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDispatch {
    /// Vehicle id or callsign.
    pub vehicle_id: String,
    /// Target position of the dispatch.
    #[serde(default, alias = "targetPosition")]
    pub position: Option<Position>,
    /// What the vehicle is assigned to.
    #[serde(default)]
    pub assignment: Option<String>,
    /// Task description.
    #[serde(default)]
    pub task: Option<String>,
}

/// Parameters of a runway-status-change event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunwayStatusChange {
    /// Runway id or display name.
    pub runway_id: String,
    /// New runway status.
    pub status: RunwayStatus,
    /// New occupant; `None` clears the runway.
    #[serde(default)]
    pub occupied_by: Option<String>,
}

/// Parameters of an alert-trigger event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertTrigger {
    /// Alert category.
    #[serde(default = "default_alert_type")]
    pub alert_type: String,
    /// Alert severity.
    #[serde(default)]
    pub severity: Severity,
    /// Alert message.
    pub message: String,
}

/// Parameters of a weather-update event.
///
/// A field left out (or `null`) keeps the current value. Any value that is
/// present, including `0`, replaces it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WeatherUpdate {
    /// Visibility in statute miles.
    pub visibility: Option<f64>,
    /// Wind speed in knots.
    pub wind_speed: Option<f64>,
    /// Wind direction in degrees.
    pub wind_direction: Option<f64>,
    /// Temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Cloud ceiling in feet.
    pub ceiling: Option<f64>,
    /// Condition summary.
    pub conditions: Option<String>,
}

/// Parameters of a communication-failure event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationFailure {
    /// Failed system (e.g. `tower-frequency`).
    pub system: String,
    /// Expected outage duration; defaults to five minutes.
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Aircraft that lose contact.
    #[serde(default)]
    pub affected_aircraft: Vec<String>,
    /// Optional operator message.
    #[serde(default)]
    pub message: Option<String>,
}

impl CommunicationFailure {
    /// Outage duration, falling back to [`DEFAULT_COMMUNICATION_OUTAGE_MS`].
    pub fn effective_duration_ms(&self) -> u64 {
        self.duration_ms.unwrap_or(DEFAULT_COMMUNICATION_OUTAGE_MS)
    }
}

/// Parameters of an emergency-scenario event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyScenario {
    /// Aircraft id or callsign declaring the emergency.
    #[serde(alias = "callsign")]
    pub aircraft_id: String,
    /// Emergency type (e.g. `engine-fire`, `medical`).
    pub emergency_type: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Parameters of a system-fault event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemFault {
    /// Faulting system.
    pub system: String,
    /// Fault classification.
    pub fault_type: String,
    /// Fault severity.
    #[serde(default)]
    pub severity: Severity,
    /// Partition tier the fault sits in.
    #[serde(default)]
    pub affected_partition: DalLevel,
    /// Whether the fault crosses into another partition.
    #[serde(default)]
    pub cross_partition_effect: bool,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Parameters of a flight-grounded event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightGrounded {
    /// Aircraft id or callsign.
    #[serde(alias = "callsign")]
    pub aircraft_id: String,
    /// Reason for the grounding.
    pub reason: String,
}

fn default_alert_type() -> String {
    String::from("general")
}

// ---------------------------------------------------------------------------
// Payload union
// ---------------------------------------------------------------------------

/// Typed parameters of an event, one variant per [`SimulationEventType`].
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// See [`AircraftMovement`].
    AircraftMovement(AircraftMovement),
    /// See [`VehicleDispatch`].
    VehicleDispatch(VehicleDispatch),
    /// See [`RunwayStatusChange`].
    RunwayStatusChange(RunwayStatusChange),
    /// See [`AlertTrigger`].
    AlertTrigger(AlertTrigger),
    /// See [`WeatherUpdate`].
    WeatherUpdate(WeatherUpdate),
    /// See [`CommunicationFailure`].
    CommunicationFailure(CommunicationFailure),
    /// See [`EmergencyScenario`].
    EmergencyScenario(EmergencyScenario),
    /// See [`SystemFault`].
    SystemFault(SystemFault),
    /// See [`FlightGrounded`].
    FlightGrounded(FlightGrounded),
}

impl EventPayload {
    /// The event kind this payload belongs to.
    pub const fn event_type(&self) -> SimulationEventType {
        match self {
            Self::AircraftMovement(_) => SimulationEventType::AircraftMovement,
            Self::VehicleDispatch(_) => SimulationEventType::VehicleDispatch,
            Self::RunwayStatusChange(_) => SimulationEventType::RunwayStatusChange,
            Self::AlertTrigger(_) => SimulationEventType::AlertTrigger,
            Self::WeatherUpdate(_) => SimulationEventType::WeatherUpdate,
            Self::CommunicationFailure(_) => SimulationEventType::CommunicationFailure,
            Self::EmergencyScenario(_) => SimulationEventType::EmergencyScenario,
            Self::SystemFault(_) => SimulationEventType::SystemFault,
            Self::FlightGrounded(_) => SimulationEventType::FlightGrounded,
        }
    }

    /// Decode a parameter block for the given event kind.
    ///
    /// A `null` block is read as an empty object so kinds whose fields are
    /// all optional need no parameters at all.
    pub fn from_parameters(
        event_type: SimulationEventType,
        parameters: Value,
    ) -> Result<Self, serde_json::Error> {
        let parameters = if parameters.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            parameters
        };
        Ok(match event_type {
            SimulationEventType::AircraftMovement => {
                Self::AircraftMovement(serde_json::from_value(parameters)?)
            }
            SimulationEventType::VehicleDispatch => {
                Self::VehicleDispatch(serde_json::from_value(parameters)?)
            }
            SimulationEventType::RunwayStatusChange => {
                Self::RunwayStatusChange(serde_json::from_value(parameters)?)
            }
            SimulationEventType::AlertTrigger => {
                Self::AlertTrigger(serde_json::from_value(parameters)?)
            }
            SimulationEventType::WeatherUpdate => {
                Self::WeatherUpdate(serde_json::from_value(parameters)?)
            }
            SimulationEventType::CommunicationFailure => {
                Self::CommunicationFailure(serde_json::from_value(parameters)?)
            }
            SimulationEventType::EmergencyScenario => {
                Self::EmergencyScenario(serde_json::from_value(parameters)?)
            }
            SimulationEventType::SystemFault => {
                Self::SystemFault(serde_json::from_value(parameters)?)
            }
            SimulationEventType::FlightGrounded => {
                Self::FlightGrounded(serde_json::from_value(parameters)?)
            }
        })
    }

    /// Encode the parameter block back to JSON.
    pub fn to_parameters(&self) -> Value {
        let encoded = match self {
            Self::AircraftMovement(p) => serde_json::to_value(p),
            Self::VehicleDispatch(p) => serde_json::to_value(p),
            Self::RunwayStatusChange(p) => serde_json::to_value(p),
            Self::AlertTrigger(p) => serde_json::to_value(p),
            Self::WeatherUpdate(p) => serde_json::to_value(p),
            Self::CommunicationFailure(p) => serde_json::to_value(p),
            Self::EmergencyScenario(p) => serde_json::to_value(p),
            Self::SystemFault(p) => serde_json::to_value(p),
            Self::FlightGrounded(p) => serde_json::to_value(p),
        };
        encoded.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A scripted event on a scenario timeline. Immutable once created.
///
/// Events order by `timestamp`; the scheduler breaks ties by insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SimulationEventRecord", into = "SimulationEventRecord")]
pub struct SimulationEvent {
    /// Author-assigned identifier.
    pub id: String,
    /// Simulation time (ms) at which the event fires.
    pub timestamp: u64,
    /// Typed parameters.
    pub payload: EventPayload,
    /// Criticality tier.
    pub dal_level: DalLevel,
    /// Handling priority.
    pub priority: Priority,
    /// Logging tags the event must carry into the audit trail.
    pub logging_requirements: Vec<String>,
    /// Free-text description of the expected compliance response.
    pub expected_compliance_response: String,
    /// Scripted handling latency, used instead of the measured latency by
    /// the response-time rule when present.
    pub simulated_response_time_ms: Option<u64>,
}

impl SimulationEvent {
    /// Create an event with DAL B, medium priority, and no logging tags.
    pub fn new(id: impl Into<String>, timestamp: u64, payload: EventPayload) -> Self {
        Self {
            id: id.into(),
            timestamp,
            payload,
            dal_level: DalLevel::B,
            priority: Priority::Medium,
            logging_requirements: Vec::new(),
            expected_compliance_response: String::new(),
            simulated_response_time_ms: None,
        }
    }

    /// Set the criticality tier.
    #[must_use]
    pub const fn with_dal_level(mut self, dal_level: DalLevel) -> Self {
        self.dal_level = dal_level;
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the logging requirement tags.
    #[must_use]
    pub fn with_logging_requirements<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.logging_requirements = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Script the handling latency seen by the response-time rule.
    #[must_use]
    pub const fn with_simulated_response_time_ms(mut self, ms: u64) -> Self {
        self.simulated_response_time_ms = Some(ms);
        self
    }

    /// The event kind.
    pub const fn event_type(&self) -> SimulationEventType {
        self.payload.event_type()
    }
}

/// Wire form of a [`SimulationEvent`], with an untyped parameter block.
///
/// This is what scenario files contain and what notifications carry to UI
/// collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SimulationEventRecord {
    /// Author-assigned identifier.
    pub id: String,
    /// Simulation time (ms) at which the event fires.
    pub timestamp: u64,
    /// Event kind.
    #[serde(rename = "type")]
    pub event_type: SimulationEventType,
    /// Kind-specific parameters.
    #[serde(default)]
    pub parameters: Value,
    /// Criticality tier.
    #[serde(default)]
    pub dal_level: DalLevel,
    /// Handling priority.
    #[serde(default)]
    pub priority: Priority,
    /// Logging requirement tags.
    #[serde(default)]
    pub logging_requirements: Vec<String>,
    /// Expected compliance response.
    #[serde(default)]
    pub expected_compliance_response: String,
    /// Scripted handling latency.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated_response_time_ms: Option<u64>,
}

impl TryFrom<SimulationEventRecord> for SimulationEvent {
    type Error = EventParseError;

    fn try_from(record: SimulationEventRecord) -> Result<Self, Self::Error> {
        let payload = EventPayload::from_parameters(record.event_type, record.parameters)
            .map_err(|source| EventParseError {
                event_id: record.id.clone(),
                event_type: record.event_type,
                source,
            })?;
        Ok(Self {
            id: record.id,
            timestamp: record.timestamp,
            payload,
            dal_level: record.dal_level,
            priority: record.priority,
            logging_requirements: record.logging_requirements,
            expected_compliance_response: record.expected_compliance_response,
            simulated_response_time_ms: record.simulated_response_time_ms,
        })
    }
}

impl From<SimulationEvent> for SimulationEventRecord {
    fn from(event: SimulationEvent) -> Self {
        Self::from(&event)
    }
}

impl From<&SimulationEvent> for SimulationEventRecord {
    fn from(event: &SimulationEvent) -> Self {
        Self {
            id: event.id.clone(),
            timestamp: event.timestamp,
            event_type: event.event_type(),
            parameters: event.payload.to_parameters(),
            dal_level: event.dal_level,
            priority: event.priority,
            logging_requirements: event.logging_requirements.clone(),
            expected_compliance_response: event.expected_compliance_response.clone(),
            simulated_response_time_ms: event.simulated_response_time_ms,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_authored_event_json() {
        let json = r#"{
            "id": "evt-1",
            "timestamp": 30000,
            "type": "aircraft-movement",
            "parameters": {"callsign": "UAL234", "runway": "09L", "status": "taxiing"},
            "dalLevel": "A",
            "priority": "high",
            "loggingRequirements": ["audit-trail"],
            "expectedComplianceResponse": "clear runway before entry"
        }"#;
        let event: SimulationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type(), SimulationEventType::AircraftMovement);
        assert_eq!(event.dal_level, DalLevel::A);
        let EventPayload::AircraftMovement(movement) = &event.payload else {
            panic!("wrong payload variant");
        };
        assert_eq!(movement.aircraft_id, "UAL234");
        assert_eq!(movement.status, Some(AircraftStatus::Taxiing));
    }

    #[test]
    fn mismatched_parameters_are_rejected() {
        let json = r#"{"id":"evt-2","timestamp":0,"type":"flight-grounded","parameters":{"aircraftId":"X"}}"#;
        let err = serde_json::from_str::<SimulationEvent>(json).unwrap_err();
        assert!(err.to_string().contains("evt-2"));
    }

    #[test]
    fn omitted_parameters_accepted_when_all_fields_optional() {
        let json = r#"{"id":"wx","timestamp":5,"type":"weather-update"}"#;
        let event: SimulationEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.payload, EventPayload::WeatherUpdate(WeatherUpdate::default()));
        assert_eq!(event.dal_level, DalLevel::B);
        assert_eq!(event.priority, Priority::Medium);
    }

    #[test]
    fn record_keeps_wire_shape() {
        let event = SimulationEvent::new(
            "evt-3",
            100,
            EventPayload::FlightGrounded(FlightGrounded {
                aircraft_id: String::from("DAL456"),
                reason: String::from("maintenance"),
            }),
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "flight-grounded");
        assert_eq!(value["parameters"]["aircraftId"], "DAL456");
        assert_eq!(value["dalLevel"], "B");
    }

    #[test]
    fn communication_outage_defaults_to_five_minutes() {
        let params: CommunicationFailure =
            serde_json::from_str(r#"{"system":"ground-frequency"}"#).unwrap();
        assert_eq!(params.effective_duration_ms(), 300_000);
    }
}
