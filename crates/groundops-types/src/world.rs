//! World-state entities transformed by the event dispatcher.
//!
//! A [`WorldState`] is a plain value: the scheduler owns the live copy and
//! every other component receives either a reference or a clone. External
//! UI mirrors receive the same shapes through notifications.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    AircraftStatus, DalLevel, RunwayStatus, Severity, VehicleStatus, VehicleType,
};
use crate::ids::AlertId;

/// A point on the airfield grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position from its coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether `other` lies within `threshold` of this position on both axes.
    pub fn within(&self, other: &Self, threshold: f64) -> bool {
        (self.x - other.x).abs() < threshold && (self.y - other.y).abs() < threshold
    }
}

/// An aircraft on the ground or in the terminal area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Aircraft {
    /// Registry identifier.
    pub id: String,
    /// ATC callsign (e.g. `UAL234`).
    pub callsign: String,
    /// Airframe type designator.
    #[serde(default)]
    pub aircraft_type: String,
    /// Current position.
    #[serde(default)]
    pub position: Position,
    /// Current operational status.
    #[serde(default)]
    pub status: AircraftStatus,
    /// Runway the aircraft is on or assigned to.
    #[serde(default)]
    pub runway: Option<String>,
    /// Gate the aircraft is at or assigned to.
    #[serde(default)]
    pub gate: Option<String>,
    /// Why the aircraft was grounded, if it was.
    #[serde(default)]
    pub grounded_reason: Option<String>,
    /// Declared emergency type, if any.
    #[serde(default)]
    pub emergency_type: Option<String>,
}

impl Aircraft {
    /// Whether `key` names this aircraft by id or by callsign.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.callsign == key
    }
}

/// A ground support vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Vehicle {
    /// Fleet identifier.
    pub id: String,
    /// Radio callsign.
    #[serde(default)]
    pub callsign: String,
    /// Vehicle class.
    #[serde(default)]
    pub vehicle_type: VehicleType,
    /// Current position.
    #[serde(default)]
    pub position: Position,
    /// Current status.
    #[serde(default)]
    pub status: VehicleStatus,
    /// What the vehicle is assigned to (aircraft, gate, runway).
    #[serde(default)]
    pub assignment: Option<String>,
    /// Task description.
    #[serde(default)]
    pub task: Option<String>,
}

impl Vehicle {
    /// Whether `key` names this vehicle by id or by callsign.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.callsign == key
    }
}

/// A runway and its occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Runway {
    /// Stable identifier.
    pub id: String,
    /// Display name (e.g. `09L`).
    #[serde(default)]
    pub name: String,
    /// Current status.
    #[serde(default)]
    pub status: RunwayStatus,
    /// Callsign or id of whatever occupies the runway.
    #[serde(default)]
    pub occupied_by: Option<String>,
}

impl Runway {
    /// Whether `key` names this runway by id or by display name.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.name == key
    }
}

/// An operational alert raised by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Alert {
    /// Unique alert identifier (never reused).
    pub id: AlertId,
    /// Alert category (e.g. `emergency`, `communication`).
    pub alert_type: String,
    /// Alert severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Simulation time (ms) at which the alert was raised.
    pub timestamp: u64,
    /// Event that raised the alert.
    #[serde(default)]
    pub source_event_id: Option<String>,
}

/// Current weather at the airfield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct Weather {
    /// Visibility in statute miles.
    pub visibility: f64,
    /// Wind speed in knots.
    pub wind_speed: f64,
    /// Wind direction in degrees.
    pub wind_direction: f64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Cloud ceiling in feet.
    pub ceiling: f64,
    /// Free-text condition summary.
    pub conditions: String,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            visibility: 10.0,
            wind_speed: 0.0,
            wind_direction: 0.0,
            temperature: 15.0,
            ceiling: 5000.0,
            conditions: String::from("clear"),
        }
    }
}

/// Outage record for a communication system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct CommunicationStatus {
    /// System name (e.g. `ground-frequency`).
    pub system: String,
    /// Status label (`failed` while the outage lasts).
    pub status: String,
    /// Simulation time (ms) of the failure.
    pub failed_at: u64,
    /// Simulation time (ms) at which restoration is expected.
    pub estimated_restoration: u64,
    /// Aircraft affected by the outage.
    #[serde(default)]
    pub affected_aircraft: Vec<String>,
}

/// Health record for a system that reported a fault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SystemHealth {
    /// System name.
    pub system: String,
    /// Reported fault type.
    pub fault_type: String,
    /// Fault severity.
    pub severity: Severity,
    /// Partition tier the fault affects.
    pub affected_partition: DalLevel,
    /// Whether the fault leaks into another partition.
    pub cross_partition_effect: bool,
    /// Simulation time (ms) of the report.
    pub reported_at: u64,
}

/// The complete mutable world the dispatcher operates on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export, export_to = "bindings/")]
pub struct WorldState {
    /// Aircraft on the airfield.
    pub aircraft: Vec<Aircraft>,
    /// Ground vehicles.
    pub vehicles: Vec<Vehicle>,
    /// Runways.
    pub runways: Vec<Runway>,
    /// Alerts raised so far, oldest first.
    pub alerts: Vec<Alert>,
    /// Current weather.
    pub weather: Weather,
    /// Communication outages keyed by system.
    pub communication_status: BTreeMap<String, CommunicationStatus>,
    /// System health entries keyed by system.
    pub system_health: BTreeMap<String, SystemHealth>,
}

impl WorldState {
    /// Look up an aircraft by id or callsign.
    pub fn find_aircraft(&self, key: &str) -> Option<&Aircraft> {
        self.aircraft.iter().find(|a| a.matches(key))
    }

    /// Look up a vehicle by id or callsign.
    pub fn find_vehicle(&self, key: &str) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.matches(key))
    }

    /// Look up a runway by id or display name.
    pub fn find_runway(&self, key: &str) -> Option<&Runway> {
        self.runways.iter().find(|r| r.matches(key))
    }
}
