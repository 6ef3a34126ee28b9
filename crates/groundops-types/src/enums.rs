//! Enumeration types for the ground-operations simulator.
//!
//! Every enum here is part of the scenario wire format, so the serde
//! spellings are the ones scenario authors write in JSON.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Criticality and priority
// ---------------------------------------------------------------------------

/// Design Assurance Level: the criticality tier of an event or log entry.
///
/// `A` is the highest tier and drives the stricter response-time and
/// logging rules.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum DalLevel {
    /// Highest criticality tier.
    A,
    /// Lower criticality tier.
    #[default]
    B,
}

impl DalLevel {
    /// Single-letter label used in exports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

impl core::fmt::Display for DalLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handling priority of a scripted event.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Priority {
    /// Background work.
    Low,
    /// Routine operations.
    #[default]
    Medium,
    /// Needs prompt handling.
    High,
    /// Safety-critical; subject to the response-time rule.
    Critical,
}

/// Severity of a violation or an alert.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Severity {
    /// Informational.
    Low,
    /// Needs attention.
    #[default]
    Medium,
    /// Serious.
    High,
    /// Immediate action required.
    Critical,
}

impl Severity {
    /// Lowercase label matching the wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

// ---------------------------------------------------------------------------
// Event and log kinds
// ---------------------------------------------------------------------------

/// The closed set of scripted event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum SimulationEventType {
    /// An aircraft changes position, status, runway, or gate.
    AircraftMovement,
    /// A ground vehicle is dispatched to a position or task.
    VehicleDispatch,
    /// A runway changes status or occupant.
    RunwayStatusChange,
    /// A free-standing alert is raised.
    AlertTrigger,
    /// Weather conditions change.
    WeatherUpdate,
    /// A communication system goes down.
    CommunicationFailure,
    /// An aircraft declares an emergency.
    EmergencyScenario,
    /// An avionics or ground system reports a fault.
    SystemFault,
    /// An aircraft is grounded.
    FlightGrounded,
}

impl SimulationEventType {
    /// Every event kind, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::AircraftMovement,
        Self::VehicleDispatch,
        Self::RunwayStatusChange,
        Self::AlertTrigger,
        Self::WeatherUpdate,
        Self::CommunicationFailure,
        Self::EmergencyScenario,
        Self::SystemFault,
        Self::FlightGrounded,
    ];

    /// Wire spelling of the event kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AircraftMovement => "aircraft-movement",
            Self::VehicleDispatch => "vehicle-dispatch",
            Self::RunwayStatusChange => "runway-status-change",
            Self::AlertTrigger => "alert-trigger",
            Self::WeatherUpdate => "weather-update",
            Self::CommunicationFailure => "communication-failure",
            Self::EmergencyScenario => "emergency-scenario",
            Self::SystemFault => "system-fault",
            Self::FlightGrounded => "flight-grounded",
        }
    }
}

impl core::fmt::Display for SimulationEventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of an audit log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum LogType {
    /// An event entered processing.
    Event,
    /// The dispatcher finished with an event.
    Response,
    /// A compliance violation was recorded.
    Compliance,
    /// A performance measurement.
    Performance,
    /// An internal failure (handler or rule error).
    Error,
}

impl LogType {
    /// Lowercase label matching the wire spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Response => "response",
            Self::Compliance => "compliance",
            Self::Performance => "performance",
            Self::Error => "error",
        }
    }
}

/// Aggregate compliance verdict over the trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum OverallStatus {
    /// No violations in the window.
    Compliant,
    /// At least one violation in the window, none critical at DAL A.
    Warning,
    /// A critical DAL A violation is in the window.
    Violation,
}

// ---------------------------------------------------------------------------
// Entity states
// ---------------------------------------------------------------------------

/// Operational status of an aircraft on the airfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AircraftStatus {
    /// At a gate or stand.
    #[default]
    Parked,
    /// Moving on taxiways.
    Taxiing,
    /// Holding short of a runway.
    Holding,
    /// Rolling for takeoff.
    Departing,
    /// Landing roll or approach.
    Arriving,
    /// Off the ground.
    Airborne,
    /// Emergency declared.
    Emergency,
    /// Held on the ground by operations.
    Grounded,
}

/// Kind of ground vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum VehicleType {
    /// Fuel truck.
    Fuel,
    /// Pushback tug.
    #[default]
    Tug,
    /// Catering truck.
    Catering,
    /// Baggage cart.
    Baggage,
    /// Maintenance crew vehicle.
    Maintenance,
    /// Follow-me car.
    FollowMe,
    /// Aircraft rescue and firefighting.
    FireRescue,
    /// Medical response.
    Ambulance,
    /// Airport police or security.
    Security,
}

impl VehicleType {
    /// Whether the vehicle belongs to the emergency-response class, which is
    /// exempt from ground separation and is reassigned during emergencies.
    pub const fn is_emergency_class(self) -> bool {
        matches!(self, Self::FireRescue | Self::Ambulance | Self::Security)
    }
}

/// Operational status of a ground vehicle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum VehicleStatus {
    /// Available for assignment.
    #[default]
    Idle,
    /// Working an assignment.
    Active,
    /// Driving back to base.
    Returning,
    /// Out of service.
    Maintenance,
}

/// Status of a runway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum RunwayStatus {
    /// Clear for use.
    #[default]
    Available,
    /// An aircraft or vehicle is on the runway.
    Occupied,
    /// Closed to traffic.
    Closed,
    /// Under maintenance.
    Maintenance,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn event_type_wire_spelling_round_trips() {
        for kind in SimulationEventType::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn severity_orders_by_gravity() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn emergency_class_vehicles() {
        assert!(VehicleType::FireRescue.is_emergency_class());
        assert!(VehicleType::Ambulance.is_emergency_class());
        assert!(!VehicleType::Fuel.is_emergency_class());
        assert!(!VehicleType::Tug.is_emergency_class());
    }

    #[test]
    fn dal_level_parses_single_letter() {
        let level: DalLevel = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(level, DalLevel::A);
        assert_eq!(level.to_string(), "A");
    }
}
