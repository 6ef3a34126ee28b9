//! Shared type definitions for the ground-operations simulator.
//!
//! Everything here is plain data: the scenario wire format, the world
//! entities the dispatcher transforms, compliance and audit records, and
//! the notification envelope. Wire types derive `ts-rs` bindings so the UI
//! collaborators can consume them from `TypeScript`.
//!
//! # Modules
//!
//! - [`ids`] -- UUID v7 wrappers for generated records
//! - [`enums`] -- DAL levels, priorities, severities, entity states
//! - [`event`] -- [`SimulationEvent`] and its typed [`EventPayload`]
//! - [`scenario`] -- [`ScenarioConfig`] documents
//! - [`world`] -- [`WorldState`] and its entities
//! - [`compliance`] -- violations and aggregated status
//! - [`log`] -- audit log entries
//! - [`status`] -- scheduler [`SimulationStatus`] snapshots
//! - [`notification`] -- the [`Notification`] envelope

pub mod compliance;
pub mod enums;
pub mod event;
pub mod ids;
pub mod log;
pub mod notification;
pub mod scenario;
pub mod status;
pub mod world;

pub use compliance::{ComplianceStatus, ComplianceViolation, TestCaseResult};
pub use enums::{
    AircraftStatus, DalLevel, LogType, OverallStatus, Priority, RunwayStatus, Severity,
    SimulationEventType, VehicleStatus, VehicleType,
};
pub use event::{
    AircraftMovement, AlertTrigger, CommunicationFailure, EmergencyScenario, EventParseError,
    EventPayload, FlightGrounded, RunwayStatusChange, SimulationEvent, SimulationEventRecord,
    SystemFault, VehicleDispatch, WeatherUpdate,
};
pub use ids::{AlertId, LogId, ViolationId};
pub use log::SimulationLog;
pub use notification::Notification;
pub use scenario::{ComplianceTestCase, ScenarioConfig, SystemParameters};
pub use status::{RunState, SimulationStatus};
pub use world::{
    Aircraft, Alert, CommunicationStatus, Position, Runway, SystemHealth, Vehicle, Weather,
    WorldState,
};
