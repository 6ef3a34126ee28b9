//! Integration tests for the scheduler's ordering, timing, fault isolation,
//! and compliance behaviour.
//!
//! Time is driven by a [`ManualClock`], so every assertion is exact.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use groundops_compliance::rules::RUNWAY_SEPARATION;
use groundops_core::{EventHandler, HandlerError, ManualClock, NotificationBus, Scheduler};
use groundops_types::{
    AlertTrigger, EventPayload, LogType, Notification, OverallStatus, RunState, Severity,
    SimulationEvent, SimulationEventType, WeatherUpdate, WorldState,
};

const RUNWAY_SCENARIO: &str = r#"{
    "id": "runway-incursion",
    "name": "Runway incursion on 09L",
    "initialState": {
        "aircraft": [
            {"id": "ac-1", "callsign": "UAL234", "aircraftType": "A320", "status": "holding"},
            {"id": "ac-2", "callsign": "DAL456", "aircraftType": "B738", "status": "departing", "runway": "09L"}
        ],
        "runways": [
            {"id": "rwy-09l", "name": "09L", "status": "occupied", "occupiedBy": "DAL456"}
        ]
    },
    "timeline": [
        {
            "id": "evt-incursion",
            "timestamp": 5000,
            "type": "aircraft-movement",
            "parameters": {"aircraftId": "UAL234", "runway": "09L", "status": "taxiing"},
            "dalLevel": "A",
            "priority": "high",
            "loggingRequirements": ["audit-trail"]
        }
    ],
    "complianceTestCases": [
        {"id": "tc-1", "eventId": "evt-incursion", "expectedRegulations": ["FAA-JO-7110.65-RUNWAY"]}
    ]
}"#;

const TWO_EVENT_SCENARIO: &str = r#"{
    "id": "two-events",
    "name": "Two alerts",
    "timeline": [
        {"id": "late", "timestamp": 60000, "type": "alert-trigger",
         "parameters": {"message": "second"}, "loggingRequirements": ["ops"]},
        {"id": "early", "timestamp": 30000, "type": "alert-trigger",
         "parameters": {"message": "first"}, "loggingRequirements": ["ops"]}
    ]
}"#;

fn scheduler() -> (Scheduler, ManualClock) {
    let clock = ManualClock::new();
    let scheduler = Scheduler::new(Arc::new(clock.clone()), NotificationBus::default());
    (scheduler, clock)
}

fn alert(id: &str, timestamp: u64) -> SimulationEvent {
    SimulationEvent::new(
        id,
        timestamp,
        EventPayload::AlertTrigger(AlertTrigger {
            alert_type: "general".to_owned(),
            severity: Severity::Low,
            message: id.to_owned(),
        }),
    )
    .with_logging_requirements(["ops"])
}

/// Drive the scheduler in `step` ms increments for `total` ms of wall time.
fn run_for(
    scheduler: &mut Scheduler,
    clock: &ManualClock,
    total: u64,
    step: u64,
) -> Vec<String> {
    let mut processed = Vec::new();
    let mut elapsed = 0_u64;
    while elapsed < total {
        let delta = step.min(total.saturating_sub(elapsed));
        clock.advance(delta);
        elapsed = elapsed.saturating_add(delta);
        if let Some(report) = scheduler.tick() {
            processed.extend(report.processed);
        }
    }
    processed
}

#[test]
fn both_events_processed_after_sixty_and_a_half_seconds() {
    let (mut s, clock) = scheduler();
    s.load_scenario_json(TWO_EVENT_SCENARIO).unwrap();
    s.start();

    let processed = run_for(&mut s, &clock, 60_500, 100);

    assert_eq!(processed, vec!["early", "late"]);
    let status = s.status();
    assert_eq!(status.queue_length, 0);
    assert_eq!(status.current_time, 60_500);
    assert_eq!(status.events_processed, 2);
}

#[test]
fn events_are_not_processed_early() {
    let (mut s, clock) = scheduler();
    s.load_scenario_json(TWO_EVENT_SCENARIO).unwrap();
    s.start();
    let processed = run_for(&mut s, &clock, 29_900, 100);
    assert!(processed.is_empty());
    assert_eq!(s.queue_length(), 2);
}

#[test]
fn paused_interval_does_not_advance_time() {
    let (mut s, clock) = scheduler();
    s.start();
    clock.advance(2_000);
    s.pause();
    let frozen = s.current_time();

    clock.advance(10_000);
    assert!(s.tick().is_none());
    assert_eq!(s.current_time(), frozen);

    s.resume();
    clock.advance(1_000);
    assert_eq!(s.current_time(), frozen.saturating_add(1_000));
}

#[test]
fn time_scale_multiplies_elapsed_time() {
    let (mut s, clock) = scheduler();
    s.set_time_scale(100.0);
    assert!((s.time_scale() - 10.0).abs() < f64::EPSILON);
    s.set_time_scale(0.0);
    assert!((s.time_scale() - 0.1).abs() < f64::EPSILON);

    s.set_time_scale(4.0);
    s.start();
    clock.advance(1_500);
    assert_eq!(s.current_time(), 6_000);
}

#[test]
fn injection_interleaves_with_timeline_in_order() {
    let (mut s, clock) = scheduler();
    s.load_scenario_json(TWO_EVENT_SCENARIO).unwrap();
    s.inject_event(alert("injected-tie", 30_000));
    s.inject_event(alert("injected-first", 10_000));
    s.inject_event(alert("injected-last", 90_000));
    s.start();

    let processed = run_for(&mut s, &clock, 100_000, 1_000);
    assert_eq!(
        processed,
        vec!["injected-first", "early", "injected-tie", "late", "injected-last"]
    );
}

#[test]
fn injection_into_a_running_simulation_fires_when_due() {
    let (mut s, clock) = scheduler();
    s.start();
    clock.advance(1_000);
    s.tick();
    // Already due: processed on the next tick.
    s.inject_event(alert("overdue", 500));
    clock.advance(100);
    let report = s.tick().unwrap();
    assert_eq!(report.processed, vec!["overdue"]);
}

#[test]
fn runway_incursion_produces_one_critical_violation() {
    let (mut s, clock) = scheduler();
    s.load_scenario_json(RUNWAY_SCENARIO).unwrap();
    s.start();
    run_for(&mut s, &clock, 5_000, 100);

    let history = s.validator().history();
    assert_eq!(history.len(), 1);
    let violation = history.first().unwrap();
    assert_eq!(violation.regulation, RUNWAY_SEPARATION);
    assert_eq!(violation.severity, Severity::Critical);
    assert_eq!(violation.event_id, "evt-incursion");

    let status = s.compliance_status();
    assert_eq!(status.overall_status, OverallStatus::Violation);
    assert_eq!(status.by_regulation.get(RUNWAY_SEPARATION), Some(&1));
    // Pure reduction: asking twice gives the same answer.
    assert_eq!(s.compliance_status(), status);

    let results = s.evaluate_test_cases();
    assert_eq!(results.len(), 1);
    assert!(results.first().unwrap().passed);

    assert_eq!(s.audit().by_type(LogType::Compliance).len(), 1);
    let aircraft = s.world().find_aircraft("UAL234").unwrap();
    assert_eq!(aircraft.runway.as_deref(), Some("09L"));
}

struct AlwaysFails;

impl EventHandler for AlwaysFails {
    fn name(&self) -> &'static str {
        "always-fails"
    }

    fn apply(
        &self,
        _event: &SimulationEvent,
        _state: &WorldState,
    ) -> Result<WorldState, HandlerError> {
        Err(HandlerError::Failed {
            reason: "injected failure".to_owned(),
        })
    }
}

#[test]
fn failing_handler_is_isolated() {
    let (mut s, clock) = scheduler();
    s.dispatcher_mut()
        .register(SimulationEventType::AlertTrigger, Box::new(AlwaysFails));
    let mut rx = s.bus().subscribe();

    let fog = SimulationEvent::new(
        "fog",
        150,
        EventPayload::WeatherUpdate(WeatherUpdate {
            visibility: Some(0.5),
            conditions: Some("fog".to_owned()),
            ..WeatherUpdate::default()
        }),
    )
    .with_logging_requirements(["ops"]);

    s.inject_event(alert("a", 100));
    s.inject_event(fog);
    s.inject_event(alert("b", 200));
    s.start();
    let processed = run_for(&mut s, &clock, 300, 100);

    // Every event still processed, and the built-in handlers' work survives.
    assert_eq!(processed, vec!["a", "fog", "b"]);
    assert_eq!(s.world().alerts.len(), 2);
    assert_eq!(s.world().weather.conditions, "fog");
    assert!((s.world().weather.visibility - 0.5).abs() < f64::EPSILON);
    assert_eq!(s.audit().by_type(LogType::Error).len(), 2);

    let mut errors = 0_u32;
    while let Ok(notification) = rx.try_recv() {
        if let Notification::EventError { source, .. } = notification {
            assert_eq!(source, "always-fails");
            errors = errors.saturating_add(1);
        }
    }
    assert_eq!(errors, 2);
}

#[test]
fn reset_reloads_the_active_scenario() {
    let (mut s, clock) = scheduler();
    s.load_scenario_json(RUNWAY_SCENARIO).unwrap();
    s.start();
    run_for(&mut s, &clock, 6_000, 100);
    assert_eq!(s.queue_length(), 0);
    let audit_len = s.audit().len();

    s.reset();

    let status = s.status();
    assert_eq!(status.state, RunState::Stopped);
    assert_eq!(status.current_time, 0);
    assert_eq!(status.queue_length, 1);
    assert!(s.validator().history().is_empty());
    assert!(s.world().find_aircraft("UAL234").unwrap().runway.is_none());
    // The audit trail survives a reset.
    assert_eq!(s.audit().len(), audit_len);
}

#[test]
fn scenario_time_scale_is_applied_on_load() {
    let (mut s, _) = scheduler();
    s.load_scenario_json(
        r#"{"id": "fast", "name": "Fast", "systemParameters": {"timeScale": 50}}"#,
    )
    .unwrap();
    assert!((s.time_scale() - 10.0).abs() < f64::EPSILON);
}

#[test]
fn notifications_follow_processing_order() {
    let (mut s, clock) = scheduler();
    let mut rx = s.bus().subscribe();
    s.inject_event(alert("a", 0));
    s.start();
    clock.advance(10);
    s.tick();

    let kinds: Vec<&str> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|n| n.name())
        .collect();
    assert_eq!(
        kinds,
        vec![
            "event-injected",
            "simulation-started",
            "event-processing",
            "state-mutation",
            "event-processed",
            "tick",
        ]
    );
}
