//! Built-in compliance rules.
//!
//! Each rule is an independent [`ComplianceRule`] that looks at one
//! processed event and a read-only view of the post-event world. Rules
//! never mutate anything; they return at most one [`Finding`] and the
//! validator turns findings into violation records.

use groundops_types::{
    DalLevel, EventPayload, Priority, Severity, SimulationEvent, WorldState,
};

use crate::config::ValidatorConfig;

/// Regulation code for partition isolation between criticality tiers.
pub const PARTITION_ISOLATION: &str = "ARINC-653-PARTITION";
/// Regulation code for runway incursion separation.
pub const RUNWAY_SEPARATION: &str = "FAA-JO-7110.65-RUNWAY";
/// Regulation code for vehicle-to-aircraft ground separation.
pub const GROUND_VEHICLE_SEPARATION: &str = "FAA-AC-150-5210-20-GROUND";
/// Regulation code for critical-event response time.
pub const RESPONSE_TIME: &str = "DO-178C-TIMING";
/// Regulation code for audit logging requirements.
pub const LOGGING_COMPLIANCE: &str = "DO-178C-LOGGING";

/// Errors a rule can raise while evaluating an event.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The event references an entity the world does not contain.
    #[error("unknown {kind} '{key}'")]
    UnknownEntity {
        /// Entity kind (aircraft, vehicle, runway).
        kind: &'static str,
        /// The id or callsign that failed to resolve.
        key: String,
    },

    /// Any other evaluation failure.
    #[error("{0}")]
    Evaluation(String),
}

/// What a rule hands back when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Human-readable description.
    pub description: String,
    /// Severity of the violation.
    pub severity: Severity,
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// The event that was just processed.
    pub event: &'a SimulationEvent,
    /// World state after the event was applied.
    pub world: &'a WorldState,
    /// Wall-clock time spent dispatching the event, in milliseconds.
    pub measured_latency_ms: u64,
    /// Rule tunables.
    pub config: &'a ValidatorConfig,
}

impl RuleContext<'_> {
    /// Latency the response-time rule judges: the scripted value when the
    /// event carries one, otherwise the measured one.
    pub fn effective_latency_ms(&self) -> u64 {
        self.event
            .simulated_response_time_ms
            .unwrap_or(self.measured_latency_ms)
    }
}

/// A single regulatory rule.
pub trait ComplianceRule: Send {
    /// Short rule name used in logs and error notifications.
    fn name(&self) -> &'static str;

    /// Regulation code recorded on violations.
    fn regulation(&self) -> &'static str;

    /// Evaluate the rule for one event.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError`] if the rule cannot reach a verdict.
    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<Finding>, RuleError>;
}

/// The default rule set, in evaluation order.
pub fn default_rules() -> Vec<Box<dyn ComplianceRule>> {
    vec![
        Box::new(PartitionIsolationRule),
        Box::new(RunwaySeparationRule),
        Box::new(GroundVehicleSeparationRule),
        Box::new(ResponseTimeRule),
        Box::new(LoggingComplianceRule),
    ]
}

// ---------------------------------------------------------------------------
// Partition isolation
// ---------------------------------------------------------------------------

/// Fires when a DAL A system fault in a level-A partition leaks across
/// partitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartitionIsolationRule;

impl ComplianceRule for PartitionIsolationRule {
    fn name(&self) -> &'static str {
        "partition-isolation"
    }

    fn regulation(&self) -> &'static str {
        PARTITION_ISOLATION
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<Finding>, RuleError> {
        if ctx.event.dal_level != DalLevel::A {
            return Ok(None);
        }
        let EventPayload::SystemFault(fault) = &ctx.event.payload else {
            return Ok(None);
        };
        if fault.affected_partition == DalLevel::A && fault.cross_partition_effect {
            return Ok(Some(Finding {
                description: format!(
                    "{} fault in level-A partition of '{}' propagated across partitions",
                    fault.fault_type, fault.system
                ),
                severity: Severity::Critical,
            }));
        }
        Ok(None)
    }
}

// ---------------------------------------------------------------------------
// Runway separation
// ---------------------------------------------------------------------------

/// Fires when an aircraft moves onto a runway another aircraft occupies.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunwaySeparationRule;

impl ComplianceRule for RunwaySeparationRule {
    fn name(&self) -> &'static str {
        "runway-separation"
    }

    fn regulation(&self) -> &'static str {
        RUNWAY_SEPARATION
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<Finding>, RuleError> {
        let EventPayload::AircraftMovement(movement) = &ctx.event.payload else {
            return Ok(None);
        };
        let Some(runway_key) = movement.runway.as_deref() else {
            return Ok(None);
        };
        let Some(runway) = ctx.world.find_runway(runway_key) else {
            return Ok(None);
        };
        let Some(occupant) = runway.occupied_by.as_deref() else {
            return Ok(None);
        };

        // The occupant may be recorded by id or callsign; it is the same
        // aircraft if either resolves to the mover.
        let mover = ctx.world.find_aircraft(&movement.aircraft_id);
        let same_aircraft = occupant == movement.aircraft_id
            || mover.is_some_and(|a| a.matches(occupant));
        if same_aircraft {
            return Ok(None);
        }

        Ok(Some(Finding {
            description: format!(
                "{} entered runway {} while occupied by {occupant}",
                movement.aircraft_id, runway.name
            ),
            severity: Severity::Critical,
        }))
    }
}

// ---------------------------------------------------------------------------
// Ground vehicle separation
// ---------------------------------------------------------------------------

/// Fires when a non-emergency vehicle is dispatched too close to an aircraft.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroundVehicleSeparationRule;

impl ComplianceRule for GroundVehicleSeparationRule {
    fn name(&self) -> &'static str {
        "ground-vehicle-separation"
    }

    fn regulation(&self) -> &'static str {
        GROUND_VEHICLE_SEPARATION
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<Finding>, RuleError> {
        let EventPayload::VehicleDispatch(dispatch) = &ctx.event.payload else {
            return Ok(None);
        };
        let Some(target) = dispatch.position else {
            return Ok(None);
        };
        let vehicle =
            ctx.world
                .find_vehicle(&dispatch.vehicle_id)
                .ok_or_else(|| RuleError::UnknownEntity {
                    kind: "vehicle",
                    key: dispatch.vehicle_id.clone(),
                })?;
        if vehicle.vehicle_type.is_emergency_class() {
            return Ok(None);
        }

        let threshold = ctx.config.proximity_threshold;
        let conflict = ctx
            .world
            .aircraft
            .iter()
            .find(|aircraft| aircraft.position.within(&target, threshold));

        Ok(conflict.map(|aircraft| Finding {
            description: format!(
                "vehicle {} dispatched within {threshold} units of aircraft {}",
                vehicle.callsign, aircraft.callsign
            ),
            severity: Severity::High,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response time
// ---------------------------------------------------------------------------

/// Fires when a critical-priority event took longer than its DAL allows.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseTimeRule;

impl ComplianceRule for ResponseTimeRule {
    fn name(&self) -> &'static str {
        "response-time"
    }

    fn regulation(&self) -> &'static str {
        RESPONSE_TIME
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<Finding>, RuleError> {
        if ctx.event.priority != Priority::Critical {
            return Ok(None);
        }
        let (limit, severity) = match ctx.event.dal_level {
            DalLevel::A => (ctx.config.dal_a_response_ms, Severity::Critical),
            DalLevel::B => (ctx.config.dal_b_response_ms, Severity::High),
        };
        let latency = ctx.effective_latency_ms();
        if latency <= limit {
            return Ok(None);
        }
        Ok(Some(Finding {
            description: format!(
                "critical DAL {} event handled in {latency} ms (limit {limit} ms)",
                ctx.event.dal_level
            ),
            severity,
        }))
    }
}

// ---------------------------------------------------------------------------
// Logging compliance
// ---------------------------------------------------------------------------

/// Fires when an event carries no logging tags, or a DAL A event lacks the
/// mandated tag.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingComplianceRule;

impl ComplianceRule for LoggingComplianceRule {
    fn name(&self) -> &'static str {
        "logging-compliance"
    }

    fn regulation(&self) -> &'static str {
        LOGGING_COMPLIANCE
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> Result<Option<Finding>, RuleError> {
        let tags = &ctx.event.logging_requirements;
        if tags.is_empty() {
            return Ok(Some(Finding {
                description: String::from("event declares no logging requirements"),
                severity: Severity::Medium,
            }));
        }
        let mandated = ctx.config.mandated_dal_a_log_tag.as_str();
        if ctx.event.dal_level == DalLevel::A && !tags.iter().any(|t| t == mandated) {
            return Ok(Some(Finding {
                description: format!("DAL A event is missing the '{mandated}' logging tag"),
                severity: Severity::Medium,
            }));
        }
        Ok(None)
    }
}
