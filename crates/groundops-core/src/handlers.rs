//! Built-in handlers, one per event kind.
//!
//! Every handler works on a clone of the incoming state and returns it, so
//! a handler that bails out with an error has changed nothing. Aircraft and
//! vehicles are matched by id or callsign; runways by id or display name.

use groundops_types::{
    Aircraft, AircraftStatus, Alert, AlertId, CommunicationStatus, EventPayload, Runway,
    Severity, SimulationEvent, SimulationEventType, SystemHealth, Vehicle, VehicleStatus,
    WorldState,
};

use crate::dispatcher::{EventHandler, HandlerError};

/// Task assigned to emergency-class vehicles pulled into an emergency.
pub const EMERGENCY_RESPONSE_TASK: &str = "emergency-response";

/// The built-in handler for `kind`.
pub fn builtin(kind: SimulationEventType) -> Box<dyn EventHandler> {
    match kind {
        SimulationEventType::AircraftMovement => Box::new(AircraftMovementHandler),
        SimulationEventType::VehicleDispatch => Box::new(VehicleDispatchHandler),
        SimulationEventType::RunwayStatusChange => Box::new(RunwayStatusHandler),
        SimulationEventType::AlertTrigger => Box::new(AlertTriggerHandler),
        SimulationEventType::WeatherUpdate => Box::new(WeatherUpdateHandler),
        SimulationEventType::CommunicationFailure => Box::new(CommunicationFailureHandler),
        SimulationEventType::EmergencyScenario => Box::new(EmergencyScenarioHandler),
        SimulationEventType::SystemFault => Box::new(SystemFaultHandler),
        SimulationEventType::FlightGrounded => Box::new(FlightGroundedHandler),
    }
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

fn aircraft_mut<'a>(
    state: &'a mut WorldState,
    key: &str,
) -> Result<&'a mut Aircraft, HandlerError> {
    state
        .aircraft
        .iter_mut()
        .find(|a| a.matches(key))
        .ok_or_else(|| HandlerError::UnknownEntity {
            kind: "aircraft",
            key: key.to_owned(),
        })
}

fn vehicle_mut<'a>(state: &'a mut WorldState, key: &str) -> Result<&'a mut Vehicle, HandlerError> {
    state
        .vehicles
        .iter_mut()
        .find(|v| v.matches(key))
        .ok_or_else(|| HandlerError::UnknownEntity {
            kind: "vehicle",
            key: key.to_owned(),
        })
}

fn runway_mut<'a>(state: &'a mut WorldState, key: &str) -> Result<&'a mut Runway, HandlerError> {
    state
        .runways
        .iter_mut()
        .find(|r| r.matches(key))
        .ok_or_else(|| HandlerError::UnknownEntity {
            kind: "runway",
            key: key.to_owned(),
        })
}

const fn mismatch(expected: SimulationEventType, event: &SimulationEvent) -> HandlerError {
    HandlerError::PayloadMismatch {
        expected,
        actual: event.payload.event_type(),
    }
}

fn raise_alert(
    state: &mut WorldState,
    event: &SimulationEvent,
    alert_type: &str,
    severity: Severity,
    message: String,
) {
    state.alerts.push(Alert {
        id: AlertId::new(),
        alert_type: alert_type.to_owned(),
        severity,
        message,
        timestamp: event.timestamp,
        source_event_id: Some(event.id.clone()),
    });
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Moves an aircraft and updates its status, runway, and gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AircraftMovementHandler;

impl EventHandler for AircraftMovementHandler {
    fn name(&self) -> &'static str {
        "aircraft-movement"
    }

    fn apply(
        &self,
        event: &SimulationEvent,
        state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        let EventPayload::AircraftMovement(p) = &event.payload else {
            return Err(mismatch(SimulationEventType::AircraftMovement, event));
        };
        let mut next = state.clone();
        let aircraft = aircraft_mut(&mut next, &p.aircraft_id)?;
        if let Some(position) = p.position {
            aircraft.position = position;
        }
        if let Some(status) = p.status {
            aircraft.status = status;
        }
        if let Some(runway) = &p.runway {
            aircraft.runway = Some(runway.clone());
        }
        if let Some(gate) = &p.gate {
            aircraft.gate = Some(gate.clone());
        }
        Ok(next)
    }
}

/// Sends a vehicle to a position or task and marks it active.
#[derive(Debug, Clone, Copy, Default)]
pub struct VehicleDispatchHandler;

impl EventHandler for VehicleDispatchHandler {
    fn name(&self) -> &'static str {
        "vehicle-dispatch"
    }

    fn apply(
        &self,
        event: &SimulationEvent,
        state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        let EventPayload::VehicleDispatch(p) = &event.payload else {
            return Err(mismatch(SimulationEventType::VehicleDispatch, event));
        };
        let mut next = state.clone();
        let vehicle = vehicle_mut(&mut next, &p.vehicle_id)?;
        if let Some(position) = p.position {
            vehicle.position = position;
        }
        if let Some(assignment) = &p.assignment {
            vehicle.assignment = Some(assignment.clone());
        }
        if let Some(task) = &p.task {
            vehicle.task = Some(task.clone());
        }
        vehicle.status = VehicleStatus::Active;
        Ok(next)
    }
}

/// Sets a runway's status and occupant.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunwayStatusHandler;

impl EventHandler for RunwayStatusHandler {
    fn name(&self) -> &'static str {
        "runway-status-change"
    }

    fn apply(
        &self,
        event: &SimulationEvent,
        state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        let EventPayload::RunwayStatusChange(p) = &event.payload else {
            return Err(mismatch(SimulationEventType::RunwayStatusChange, event));
        };
        let mut next = state.clone();
        let runway = runway_mut(&mut next, &p.runway_id)?;
        runway.status = p.status;
        runway.occupied_by.clone_from(&p.occupied_by);
        Ok(next)
    }
}

/// Appends a free-standing alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertTriggerHandler;

impl EventHandler for AlertTriggerHandler {
    fn name(&self) -> &'static str {
        "alert-trigger"
    }

    fn apply(
        &self,
        event: &SimulationEvent,
        state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        let EventPayload::AlertTrigger(p) = &event.payload else {
            return Err(mismatch(SimulationEventType::AlertTrigger, event));
        };
        let mut next = state.clone();
        raise_alert(&mut next, event, &p.alert_type, p.severity, p.message.clone());
        Ok(next)
    }
}

/// Overwrites every weather field the event provides.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeatherUpdateHandler;

impl EventHandler for WeatherUpdateHandler {
    fn name(&self) -> &'static str {
        "weather-update"
    }

    fn apply(
        &self,
        event: &SimulationEvent,
        state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        let EventPayload::WeatherUpdate(p) = &event.payload else {
            return Err(mismatch(SimulationEventType::WeatherUpdate, event));
        };
        let mut next = state.clone();
        let weather = &mut next.weather;
        if let Some(v) = p.visibility {
            weather.visibility = v;
        }
        if let Some(v) = p.wind_speed {
            weather.wind_speed = v;
        }
        if let Some(v) = p.wind_direction {
            weather.wind_direction = v;
        }
        if let Some(v) = p.temperature {
            weather.temperature = v;
        }
        if let Some(v) = p.ceiling {
            weather.ceiling = v;
        }
        if let Some(v) = &p.conditions {
            weather.conditions.clone_from(v);
        }
        Ok(next)
    }
}

/// Records an outage and raises a high-severity alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommunicationFailureHandler;

impl EventHandler for CommunicationFailureHandler {
    fn name(&self) -> &'static str {
        "communication-failure"
    }

    fn apply(
        &self,
        event: &SimulationEvent,
        state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        let EventPayload::CommunicationFailure(p) = &event.payload else {
            return Err(mismatch(SimulationEventType::CommunicationFailure, event));
        };
        let mut next = state.clone();
        next.communication_status.insert(
            p.system.clone(),
            CommunicationStatus {
                system: p.system.clone(),
                status: "failed".to_owned(),
                failed_at: event.timestamp,
                estimated_restoration: event.timestamp.saturating_add(p.effective_duration_ms()),
                affected_aircraft: p.affected_aircraft.clone(),
            },
        );
        let message = p
            .message
            .clone()
            .unwrap_or_else(|| format!("{} communication failure", p.system));
        raise_alert(&mut next, event, "communication", Severity::High, message);
        Ok(next)
    }
}

/// Declares an emergency and pulls every idle emergency-class vehicle in.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmergencyScenarioHandler;

impl EventHandler for EmergencyScenarioHandler {
    fn name(&self) -> &'static str {
        "emergency-scenario"
    }

    fn apply(
        &self,
        event: &SimulationEvent,
        state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        let EventPayload::EmergencyScenario(p) = &event.payload else {
            return Err(mismatch(SimulationEventType::EmergencyScenario, event));
        };
        let mut next = state.clone();
        let aircraft = aircraft_mut(&mut next, &p.aircraft_id)?;
        aircraft.status = AircraftStatus::Emergency;
        aircraft.emergency_type = Some(p.emergency_type.clone());
        let callsign = aircraft.callsign.clone();
        let position = aircraft.position;

        for vehicle in next
            .vehicles
            .iter_mut()
            .filter(|v| v.vehicle_type.is_emergency_class() && v.status == VehicleStatus::Idle)
        {
            vehicle.status = VehicleStatus::Active;
            vehicle.assignment = Some(callsign.clone());
            vehicle.task = Some(EMERGENCY_RESPONSE_TASK.to_owned());
            vehicle.position = position;
        }

        let message = p.description.clone().unwrap_or_else(|| {
            format!("{callsign} declared {} emergency", p.emergency_type)
        });
        raise_alert(&mut next, event, "emergency", Severity::Critical, message);
        Ok(next)
    }
}

/// Records a system-health entry and raises an alert at the fault's severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemFaultHandler;

impl EventHandler for SystemFaultHandler {
    fn name(&self) -> &'static str {
        "system-fault"
    }

    fn apply(
        &self,
        event: &SimulationEvent,
        state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        let EventPayload::SystemFault(p) = &event.payload else {
            return Err(mismatch(SimulationEventType::SystemFault, event));
        };
        let mut next = state.clone();
        next.system_health.insert(
            p.system.clone(),
            SystemHealth {
                system: p.system.clone(),
                fault_type: p.fault_type.clone(),
                severity: p.severity,
                affected_partition: p.affected_partition,
                cross_partition_effect: p.cross_partition_effect,
                reported_at: event.timestamp,
            },
        );
        let message = p
            .description
            .clone()
            .unwrap_or_else(|| format!("{} fault: {}", p.system, p.fault_type));
        raise_alert(&mut next, event, "system-fault", p.severity, message);
        Ok(next)
    }
}

/// Grounds an aircraft and raises a high-severity alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlightGroundedHandler;

impl EventHandler for FlightGroundedHandler {
    fn name(&self) -> &'static str {
        "flight-grounded"
    }

    fn apply(
        &self,
        event: &SimulationEvent,
        state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        let EventPayload::FlightGrounded(p) = &event.payload else {
            return Err(mismatch(SimulationEventType::FlightGrounded, event));
        };
        let mut next = state.clone();
        let aircraft = aircraft_mut(&mut next, &p.aircraft_id)?;
        aircraft.status = AircraftStatus::Grounded;
        aircraft.grounded_reason = Some(p.reason.clone());
        let message = format!("{} grounded: {}", aircraft.callsign, p.reason);
        raise_alert(&mut next, event, "flight-grounded", Severity::High, message);
        Ok(next)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use groundops_types::{
        AircraftMovement, CommunicationFailure, DalLevel, EmergencyScenario, FlightGrounded,
        Position, RunwayStatus, RunwayStatusChange, SystemFault, VehicleDispatch, VehicleType,
        WeatherUpdate,
    };

    use super::*;

    fn world() -> WorldState {
        WorldState {
            aircraft: vec![Aircraft {
                id: "ac-1".to_owned(),
                callsign: "UAL234".to_owned(),
                aircraft_type: "A320".to_owned(),
                position: Position::new(100.0, 200.0),
                status: AircraftStatus::Taxiing,
                runway: None,
                gate: Some("B4".to_owned()),
                grounded_reason: None,
                emergency_type: None,
            }],
            vehicles: vec![
                Vehicle {
                    id: "veh-fire".to_owned(),
                    callsign: "FIRE1".to_owned(),
                    vehicle_type: VehicleType::FireRescue,
                    position: Position::new(0.0, 0.0),
                    status: VehicleStatus::Idle,
                    assignment: None,
                    task: None,
                },
                Vehicle {
                    id: "veh-amb".to_owned(),
                    callsign: "MED1".to_owned(),
                    vehicle_type: VehicleType::Ambulance,
                    position: Position::new(0.0, 0.0),
                    status: VehicleStatus::Active,
                    assignment: Some("gate-A1".to_owned()),
                    task: None,
                },
                Vehicle {
                    id: "veh-fuel".to_owned(),
                    callsign: "FUEL7".to_owned(),
                    vehicle_type: VehicleType::Fuel,
                    position: Position::new(0.0, 0.0),
                    status: VehicleStatus::Idle,
                    assignment: None,
                    task: None,
                },
            ],
            runways: vec![Runway {
                id: "rwy-09l".to_owned(),
                name: "09L".to_owned(),
                status: RunwayStatus::Available,
                occupied_by: None,
            }],
            ..WorldState::default()
        }
    }

    fn apply(payload: EventPayload) -> Result<WorldState, HandlerError> {
        let event = SimulationEvent::new("evt", 5_000, payload);
        builtin(event.event_type()).apply(&event, &world())
    }

    #[test]
    fn movement_matches_by_callsign() {
        let next = apply(EventPayload::AircraftMovement(AircraftMovement {
            aircraft_id: "UAL234".to_owned(),
            position: Some(Position::new(300.0, 200.0)),
            status: Some(AircraftStatus::Holding),
            runway: Some("09L".to_owned()),
            gate: None,
        }))
        .unwrap();
        let aircraft = next.find_aircraft("ac-1").unwrap();
        assert_eq!(aircraft.status, AircraftStatus::Holding);
        assert_eq!(aircraft.runway.as_deref(), Some("09L"));
        // Unset fields are untouched.
        assert_eq!(aircraft.gate.as_deref(), Some("B4"));
    }

    #[test]
    fn unknown_aircraft_is_an_error() {
        let err = apply(EventPayload::AircraftMovement(AircraftMovement {
            aircraft_id: "NOPE".to_owned(),
            position: None,
            status: None,
            runway: None,
            gate: None,
        }))
        .unwrap_err();
        assert!(matches!(err, HandlerError::UnknownEntity { kind: "aircraft", .. }));
    }

    #[test]
    fn dispatch_activates_vehicle() {
        let next = apply(EventPayload::VehicleDispatch(VehicleDispatch {
            vehicle_id: "FUEL7".to_owned(),
            position: Some(Position::new(110.0, 190.0)),
            assignment: Some("UAL234".to_owned()),
            task: Some("refuel".to_owned()),
        }))
        .unwrap();
        let vehicle = next.find_vehicle("veh-fuel").unwrap();
        assert_eq!(vehicle.status, VehicleStatus::Active);
        assert_eq!(vehicle.position, Position::new(110.0, 190.0));
    }

    #[test]
    fn runway_status_sets_occupant() {
        let next = apply(EventPayload::RunwayStatusChange(RunwayStatusChange {
            runway_id: "09L".to_owned(),
            status: RunwayStatus::Occupied,
            occupied_by: Some("DAL456".to_owned()),
        }))
        .unwrap();
        let runway = next.find_runway("rwy-09l").unwrap();
        assert_eq!(runway.status, RunwayStatus::Occupied);
        assert_eq!(runway.occupied_by.as_deref(), Some("DAL456"));
    }

    #[test]
    fn weather_update_only_touches_provided_fields() {
        let next = apply(EventPayload::WeatherUpdate(WeatherUpdate {
            visibility: Some(0.5),
            wind_speed: Some(0.0),
            conditions: Some("fog".to_owned()),
            ..WeatherUpdate::default()
        }))
        .unwrap();
        assert!((next.weather.visibility - 0.5).abs() < f64::EPSILON);
        assert!(next.weather.wind_speed.abs() < f64::EPSILON);
        assert!((next.weather.ceiling - 5000.0).abs() < f64::EPSILON);
        assert_eq!(next.weather.conditions, "fog");
    }

    #[test]
    fn communication_failure_uses_default_duration() {
        let next = apply(EventPayload::CommunicationFailure(CommunicationFailure {
            system: "ground-frequency".to_owned(),
            duration_ms: None,
            affected_aircraft: vec!["UAL234".to_owned()],
            message: None,
        }))
        .unwrap();
        let status = next.communication_status.get("ground-frequency").unwrap();
        assert_eq!(status.failed_at, 5_000);
        assert_eq!(status.estimated_restoration, 305_000);
        let alert = next.alerts.first().unwrap();
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.source_event_id.as_deref(), Some("evt"));
    }

    #[test]
    fn emergency_reassigns_idle_emergency_vehicles_only() {
        let next = apply(EventPayload::EmergencyScenario(EmergencyScenario {
            aircraft_id: "UAL234".to_owned(),
            emergency_type: "engine-fire".to_owned(),
            description: None,
        }))
        .unwrap();
        assert_eq!(
            next.find_aircraft("UAL234").map(|a| a.status),
            Some(AircraftStatus::Emergency)
        );
        let fire = next.find_vehicle("FIRE1").unwrap();
        assert_eq!(fire.assignment.as_deref(), Some("UAL234"));
        assert_eq!(fire.position, Position::new(100.0, 200.0));
        // Busy ambulance and non-emergency fuel truck are left alone.
        assert_eq!(
            next.find_vehicle("MED1").and_then(|v| v.assignment.as_deref()),
            Some("gate-A1")
        );
        assert_eq!(next.find_vehicle("FUEL7").map(|v| v.status), Some(VehicleStatus::Idle));
        assert_eq!(next.alerts.first().map(|a| a.severity), Some(Severity::Critical));
    }

    #[test]
    fn system_fault_records_health() {
        let next = apply(EventPayload::SystemFault(SystemFault {
            system: "fms".to_owned(),
            fault_type: "memory-corruption".to_owned(),
            severity: Severity::Critical,
            affected_partition: DalLevel::A,
            cross_partition_effect: true,
            description: None,
        }))
        .unwrap();
        let health = next.system_health.get("fms").unwrap();
        assert!(health.cross_partition_effect);
        assert_eq!(health.reported_at, 5_000);
        assert_eq!(next.alerts.len(), 1);
    }

    #[test]
    fn grounding_sets_reason_and_alert() {
        let next = apply(EventPayload::FlightGrounded(FlightGrounded {
            aircraft_id: "ac-1".to_owned(),
            reason: "bird strike".to_owned(),
        }))
        .unwrap();
        let aircraft = next.find_aircraft("UAL234").unwrap();
        assert_eq!(aircraft.status, AircraftStatus::Grounded);
        assert_eq!(aircraft.grounded_reason.as_deref(), Some("bird strike"));
        assert_eq!(next.alerts.first().map(|a| a.severity), Some(Severity::High));
    }

    #[test]
    fn alert_ids_are_unique() {
        let event = SimulationEvent::new(
            "evt",
            0,
            EventPayload::AlertTrigger(groundops_types::AlertTrigger {
                alert_type: "general".to_owned(),
                severity: Severity::Low,
                message: "x".to_owned(),
            }),
        );
        let handler = AlertTriggerHandler;
        let once = handler.apply(&event, &WorldState::default()).unwrap();
        let twice = handler.apply(&event, &once).unwrap();
        let ids: Vec<_> = twice.alerts.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids.first(), ids.get(1));
    }

    #[test]
    fn mismatched_payload_is_rejected() {
        let event = SimulationEvent::new(
            "evt",
            0,
            EventPayload::WeatherUpdate(WeatherUpdate::default()),
        );
        let err = FlightGroundedHandler
            .apply(&event, &WorldState::default())
            .unwrap_err();
        assert!(matches!(err, HandlerError::PayloadMismatch { .. }));
    }
}
