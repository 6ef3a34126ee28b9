//! The scenario/event scheduler.
//!
//! The [`Scheduler`] owns the event queue, the simulation clock, and the
//! live [`WorldState`]. On every tick it recomputes simulation time from
//! the wall clock and drains every due event, in order, through the
//! dispatcher, the compliance validator, and the audit log.
//!
//! # Time model
//!
//! While running, simulation time is
//! `base + (wall_now - anchor) * time_scale`, where `base` is the
//! simulation time frozen at the last anchor. The mapping is re-anchored
//! on start, resume, and every time-scale change, so simulation time is
//! continuous and never runs backwards. While paused or stopped it does
//! not move.
//!
//! # Ordering
//!
//! The queue is kept sorted by timestamp. Events with equal timestamps keep
//! their insertion order: injection inserts after every queued event with
//! the same timestamp.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use groundops_audit::{AuditError, AuditLog, ResponseDetails};
use groundops_compliance::ComplianceValidator;
use groundops_types::{
    ComplianceStatus, Notification, RunState, ScenarioConfig, SimulationEvent,
    SimulationEventRecord, SimulationLog, SimulationStatus, TestCaseResult, WorldState,
};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::clock::WallClock;
use crate::dispatcher::Dispatcher;
use crate::library::{ScenarioError, ScenarioLibrary, ScenarioSummary};
use crate::notifications::NotificationBus;

/// Smallest accepted time scale.
pub const MIN_TIME_SCALE: f64 = 0.1;

/// Largest accepted time scale.
pub const MAX_TIME_SCALE: f64 = 10.0;

/// Export formats offered by the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Flat CSV, one row per entry.
    Csv,
    /// Full JSON with summary.
    Json,
    /// Restricted, checksummed audit JSON.
    Audit,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Simulation time after the tick.
    pub current_time: u64,
    /// Ids of the events processed, in order.
    pub processed: Vec<String>,
    /// Events still queued.
    pub queue_length: usize,
}

/// Clamp a requested time scale into the accepted range.
///
/// `NaN` is treated as the minimum.
pub fn clamp_time_scale(scale: f64) -> f64 {
    if scale.is_nan() {
        MIN_TIME_SCALE
    } else {
        scale.clamp(MIN_TIME_SCALE, MAX_TIME_SCALE)
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scaled_elapsed(elapsed_ms: u64, time_scale: f64) -> u64 {
    // Both factors are non-negative and the product saturates on cast.
    (elapsed_ms as f64 * time_scale).round() as u64
}

fn wall_now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Drives a scenario timeline against the world state.
pub struct Scheduler {
    state: RunState,
    queue: VecDeque<SimulationEvent>,
    current_time: u64,
    base_time: u64,
    anchor_ms: Option<u64>,
    time_scale: f64,
    max_events_per_tick: usize,
    events_processed: u64,
    active_scenario: Option<String>,
    world: WorldState,
    library: ScenarioLibrary,
    dispatcher: Dispatcher,
    validator: ComplianceValidator,
    audit: AuditLog,
    bus: NotificationBus,
    clock: Arc<dyn WallClock>,
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("current_time", &self.current_time)
            .field("time_scale", &self.time_scale)
            .field("queue_length", &self.queue.len())
            .field("active_scenario", &self.active_scenario)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Create a stopped scheduler with default components.
    pub fn new(clock: Arc<dyn WallClock>, bus: NotificationBus) -> Self {
        Self {
            state: RunState::Stopped,
            queue: VecDeque::new(),
            current_time: 0,
            base_time: 0,
            anchor_ms: None,
            time_scale: 1.0,
            max_events_per_tick: 0,
            events_processed: 0,
            active_scenario: None,
            world: WorldState::default(),
            library: ScenarioLibrary::new(),
            dispatcher: Dispatcher::with_builtin_handlers(),
            validator: ComplianceValidator::default(),
            audit: AuditLog::default(),
            bus,
            clock,
        }
    }

    /// Replace the dispatcher.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    /// Replace the compliance validator.
    #[must_use]
    pub fn with_validator(mut self, validator: ComplianceValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the audit log.
    #[must_use]
    pub fn with_audit_log(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// Replace the scenario library.
    #[must_use]
    pub fn with_library(mut self, library: ScenarioLibrary) -> Self {
        self.library = library;
        self
    }

    /// Set the initial time scale (clamped).
    #[must_use]
    pub fn with_time_scale(mut self, scale: f64) -> Self {
        self.time_scale = clamp_time_scale(scale);
        self
    }

    /// Cap the number of events drained per tick (0 = unlimited).
    #[must_use]
    pub const fn with_max_events_per_tick(mut self, max: usize) -> Self {
        self.max_events_per_tick = max;
        self
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Simulation time as of this instant, without mutating anything.
    fn live_time(&self) -> u64 {
        match (self.state, self.anchor_ms) {
            (RunState::Running, Some(anchor)) => {
                let elapsed = self.clock.now_ms().saturating_sub(anchor);
                self.base_time
                    .saturating_add(scaled_elapsed(elapsed, self.time_scale))
                    .max(self.current_time)
            }
            _ => self.current_time,
        }
    }

    fn advance_time(&mut self) {
        self.current_time = self.live_time();
    }

    fn reanchor(&mut self) {
        self.base_time = self.current_time;
        self.anchor_ms = Some(self.clock.now_ms());
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start ticking. A no-op while running; resumes when paused.
    pub fn start(&mut self) {
        match self.state {
            RunState::Running => debug!("Start ignored, already running"),
            RunState::Paused => self.resume(),
            RunState::Stopped => {
                self.state = RunState::Running;
                self.reanchor();
                info!(
                    current_time = self.current_time,
                    time_scale = self.time_scale,
                    queue_length = self.queue.len(),
                    "Simulation started"
                );
                self.bus.publish(Notification::SimulationStarted {
                    current_time: self.current_time,
                });
            }
        }
    }

    /// Freeze simulation time. A no-op unless running.
    pub fn pause(&mut self) {
        if self.state != RunState::Running {
            debug!(state = ?self.state, "Pause ignored");
            return;
        }
        self.advance_time();
        self.state = RunState::Paused;
        self.anchor_ms = None;
        info!(current_time = self.current_time, "Simulation paused");
        self.bus.publish(Notification::SimulationPaused {
            current_time: self.current_time,
        });
    }

    /// Continue from the frozen time. A no-op unless paused.
    pub fn resume(&mut self) {
        if self.state != RunState::Paused {
            debug!(state = ?self.state, "Resume ignored");
            return;
        }
        self.state = RunState::Running;
        self.reanchor();
        info!(current_time = self.current_time, "Simulation resumed");
        self.bus.publish(Notification::SimulationResumed {
            current_time: self.current_time,
        });
    }

    /// Halt ticking. Time freezes and the queue is kept.
    pub fn stop(&mut self) {
        if self.state == RunState::Stopped {
            debug!("Stop ignored, already stopped");
            return;
        }
        self.advance_time();
        self.state = RunState::Stopped;
        self.anchor_ms = None;
        info!(current_time = self.current_time, "Simulation stopped");
        self.bus.publish(Notification::SimulationStopped {
            current_time: self.current_time,
        });
    }

    /// Stop, rewind to time zero, and reload the active scenario.
    ///
    /// Compliance history is cleared; the audit log is kept.
    pub fn reset(&mut self) {
        self.stop();
        self.current_time = 0;
        self.base_time = 0;
        self.events_processed = 0;
        self.queue.clear();
        self.validator.clear();

        let reloaded = self
            .active_scenario
            .as_deref()
            .and_then(|id| self.library.get(id))
            .map(|scenario| (scenario.sorted_timeline(), scenario.initial_state.clone()));
        match reloaded {
            Some((timeline, world)) => {
                self.queue = timeline;
                self.world = world;
            }
            None => self.world = WorldState::default(),
        }

        info!(
            scenario_id = ?self.active_scenario,
            queue_length = self.queue.len(),
            "Simulation reset"
        );
        self.bus.publish(Notification::SimulationReset {
            scenario_id: self.active_scenario.clone(),
        });
    }

    /// Set the time scale, clamped to `[0.1, 10.0]`. Returns the applied value.
    pub fn set_time_scale(&mut self, scale: f64) -> f64 {
        let clamped = clamp_time_scale(scale);
        if self.state == RunState::Running {
            self.advance_time();
            self.reanchor();
        }
        self.time_scale = clamped;
        info!(requested = scale, time_scale = clamped, "Time scale changed");
        self.bus.publish(Notification::TimeScaleChanged {
            time_scale: clamped,
        });
        clamped
    }

    // -----------------------------------------------------------------------
    // Queue
    // -----------------------------------------------------------------------

    /// Insert an event in timestamp order, after any queued event with the
    /// same timestamp. Allowed in every state.
    pub fn inject_event(&mut self, event: SimulationEvent) {
        let index = self
            .queue
            .iter()
            .position(|queued| queued.timestamp > event.timestamp)
            .unwrap_or(self.queue.len());
        let record = SimulationEventRecord::from(&event);
        debug!(event_id = %event.id, timestamp = event.timestamp, index, "Event injected");
        self.queue.insert(index, event);
        self.bus.publish(Notification::EventInjected {
            event: record,
            queue_length: self.queue.len(),
        });
    }

    /// Make `id` the active scenario: queue its sorted timeline and replace
    /// the world with its initial state.
    ///
    /// The scenario's `timeScale` parameter, if any, is applied.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownScenario`] for an unregistered id;
    /// the scheduler is left untouched.
    pub fn load_scenario(&mut self, id: &str) -> Result<(), ScenarioError> {
        let scenario = self.library.require(id)?;
        let timeline = scenario.sorted_timeline();
        let world = scenario.initial_state.clone();
        let name = scenario.name.clone();
        let time_scale = scenario.system_parameters.time_scale;

        self.queue = timeline;
        self.world = world;
        self.active_scenario = Some(id.to_owned());
        if let Some(scale) = time_scale {
            self.set_time_scale(scale);
        }

        info!(scenario_id = id, events = self.queue.len(), "Scenario loaded");
        self.bus.publish(Notification::ScenarioLoaded {
            scenario_id: id.to_owned(),
            name,
            event_count: self.queue.len(),
            initial_state: self.world.clone(),
        });
        Ok(())
    }

    /// Parse a scenario document, register it, and load it. Returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Parse`] if the document is malformed; the
    /// scheduler is left untouched.
    pub fn load_scenario_json(&mut self, json: &str) -> Result<String, ScenarioError> {
        let id = self.library.register_json(json)?;
        self.load_scenario(&id)?;
        Ok(id)
    }

    /// Register a scenario without loading it.
    pub fn register_scenario(&mut self, scenario: ScenarioConfig) {
        self.library.register(scenario);
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Advance simulation time and process every due event.
    ///
    /// Returns `None` when not running.
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.state != RunState::Running {
            return None;
        }
        self.advance_time();

        let started = Instant::now();
        let mut processed = Vec::new();
        while self
            .queue
            .front()
            .is_some_and(|head| head.timestamp <= self.current_time)
        {
            if self.max_events_per_tick > 0 && processed.len() >= self.max_events_per_tick {
                debug!(
                    limit = self.max_events_per_tick,
                    "Per-tick event limit reached, deferring the rest"
                );
                break;
            }
            let Some(event) = self.queue.pop_front() else {
                break;
            };
            processed.push(event.id.clone());
            self.process_event(&event);
        }

        if !processed.is_empty() {
            self.audit.record_performance(
                "tick",
                json!({
                    "simulationTime": self.current_time,
                    "eventsProcessed": processed.len(),
                    "tickDurationMs": elapsed_ms(started),
                    "queueLength": self.queue.len(),
                }),
                wall_now_ms(),
            );
        }
        self.bus.publish(Notification::Tick {
            current_time: self.current_time,
            queue_length: self.queue.len(),
        });
        Some(TickReport {
            current_time: self.current_time,
            processed,
            queue_length: self.queue.len(),
        })
    }

    /// Dispatch one event, validate the result, and record everything.
    fn process_event(&mut self, event: &SimulationEvent) {
        let kind = event.event_type();
        let logged_at = wall_now_ms();
        self.bus.publish(Notification::EventProcessing {
            event_id: event.id.clone(),
            event_type: kind,
        });
        self.audit.record_event(event, logged_at);

        let started = Instant::now();
        let outcome = self.dispatcher.dispatch(event, &self.world);
        let processing_time_ms = elapsed_ms(started);

        for failure in &outcome.failures {
            error!(
                event_id = %event.id,
                handler = failure.handler,
                error = %failure.error,
                "Event handler failed"
            );
            self.report_error(event, failure.handler, failure.error.to_string(), logged_at);
        }

        let applied = outcome.applied();
        let handlers_run = outcome.handlers_run;
        let handler_failures = outcome.failures.len();
        self.world = outcome.state;
        if applied {
            self.bus.publish(Notification::StateMutation {
                event_type: kind,
                event: SimulationEventRecord::from(event),
            });
        }

        let report = self
            .validator
            .validate(event, &self.world, processing_time_ms, logged_at);
        for violation in &report.violations {
            warn!(
                event_id = %event.id,
                regulation = %violation.regulation,
                severity = violation.severity.as_str(),
                "Compliance violation"
            );
            self.audit.record_violation(violation);
        }
        for failure in &report.failures {
            let source = format!("rule:{}", failure.rule);
            self.report_error(event, &source, failure.message.clone(), logged_at);
        }

        self.audit.record_response(
            event,
            &ResponseDetails {
                processing_time_ms,
                simulation_time: self.current_time,
                handlers_run,
                handler_failures,
                violation_count: report.violations.len(),
            },
            logged_at,
        );
        self.events_processed = self.events_processed.saturating_add(1);

        debug!(
            event_id = %event.id,
            event_type = kind.as_str(),
            processing_time_ms,
            violations = report.violations.len(),
            "Event processed"
        );
        self.bus.publish(Notification::EventProcessed {
            event_id: event.id.clone(),
            event_type: kind,
            processing_time_ms,
            violations: report.violations,
        });
    }

    /// Record a handler or rule failure and announce it.
    fn report_error(&mut self, event: &SimulationEvent, source: &str, message: String, at: i64) {
        self.audit
            .record_error(Some(&event.id), Some(event.dal_level), source, &message, at);
        self.bus.publish(Notification::EventError {
            event_id: event.id.clone(),
            source: source.to_owned(),
            message,
        });
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Point-in-time status snapshot.
    pub fn status(&self) -> SimulationStatus {
        SimulationStatus {
            state: self.state,
            current_time: self.live_time(),
            time_scale: self.time_scale,
            queue_length: self.queue.len(),
            next_event_time: self.queue.front().map(|e| e.timestamp),
            active_scenario: self.active_scenario.clone(),
            events_processed: self.events_processed,
        }
    }

    /// Lifecycle state.
    pub const fn run_state(&self) -> RunState {
        self.state
    }

    /// Simulation time as of this instant.
    pub fn current_time(&self) -> u64 {
        self.live_time()
    }

    /// Current time scale.
    pub const fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Queued events, in processing order.
    pub fn queue(&self) -> impl Iterator<Item = &SimulationEvent> {
        self.queue.iter()
    }

    /// Number of queued events.
    pub fn queue_length(&self) -> usize {
        self.queue.len()
    }

    /// The live world state.
    pub const fn world(&self) -> &WorldState {
        &self.world
    }

    /// Id of the active scenario.
    pub fn active_scenario(&self) -> Option<&str> {
        self.active_scenario.as_deref()
    }

    /// Summaries of every registered scenario.
    pub fn scenarios(&self) -> Vec<ScenarioSummary> {
        self.library.list()
    }

    /// The compliance validator.
    pub const fn validator(&self) -> &ComplianceValidator {
        &self.validator
    }

    /// Aggregated compliance over the trailing window ending now.
    pub fn compliance_status(&self) -> ComplianceStatus {
        self.validator.status(wall_now_ms())
    }

    /// Check the active scenario's compliance test cases against history.
    pub fn evaluate_test_cases(&self) -> Vec<TestCaseResult> {
        self.active_scenario
            .as_deref()
            .and_then(|id| self.library.get(id))
            .map(|scenario| {
                self.validator
                    .evaluate_test_cases(&scenario.compliance_test_cases)
            })
            .unwrap_or_default()
    }

    /// The audit log.
    pub const fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// The `limit` most recent audit entries, newest first.
    pub fn recent_logs(&self, limit: usize) -> Vec<SimulationLog> {
        self.audit.recent(limit)
    }

    /// Export the audit log.
    ///
    /// # Errors
    ///
    /// Returns an [`AuditError`] if serialization fails.
    pub fn export_logs(&self, format: ExportFormat) -> Result<String, AuditError> {
        match format {
            ExportFormat::Csv => self.audit.export_csv(),
            ExportFormat::Json => self.audit.export_json(),
            ExportFormat::Audit => self.audit.export_audit(),
        }
    }

    /// Mutable access to the dispatcher, for registering extra handlers.
    pub const fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// The notification bus.
    pub const fn bus(&self) -> &NotificationBus {
        &self.bus
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use groundops_types::{AlertTrigger, EventPayload, LogType, Severity};

    use super::*;
    use crate::clock::ManualClock;

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
        .with_logging_requirements(["audit-trail"])
    }

    fn scheduler() -> (Scheduler, ManualClock) {
        let clock = ManualClock::new();
        let scheduler = Scheduler::new(Arc::new(clock.clone()), NotificationBus::default());
        (scheduler, clock)
    }

    #[test]
    fn time_scale_is_clamped() {
        assert!((clamp_time_scale(0.0) - 0.1).abs() < f64::EPSILON);
        assert!((clamp_time_scale(100.0) - 10.0).abs() < f64::EPSILON);
        assert!((clamp_time_scale(f64::NAN) - 0.1).abs() < f64::EPSILON);
        assert!((clamp_time_scale(2.5) - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn injection_keeps_ties_in_insertion_order() {
        let (mut s, _) = scheduler();
        s.inject_event(alert("b", 200));
        s.inject_event(alert("a", 100));
        s.inject_event(alert("b2", 200));
        s.inject_event(alert("c", 300));
        let ids: Vec<&str> = s.queue().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "b2", "c"]);
    }

    #[test]
    fn time_advances_only_while_running() {
        let (mut s, clock) = scheduler();
        clock.advance(5_000);
        assert_eq!(s.current_time(), 0);
        s.start();
        clock.advance(1_000);
        assert_eq!(s.current_time(), 1_000);
        s.stop();
        clock.advance(1_000);
        assert_eq!(s.current_time(), 1_000);
        // Start after stop continues from the frozen time.
        s.start();
        clock.advance(500);
        assert_eq!(s.current_time(), 1_500);
    }

    #[test]
    fn scale_change_keeps_time_continuous() {
        let (mut s, clock) = scheduler();
        s.start();
        clock.advance(1_000);
        s.set_time_scale(2.0);
        assert_eq!(s.current_time(), 1_000);
        clock.advance(1_000);
        assert_eq!(s.current_time(), 3_000);
    }

    #[test]
    fn lifecycle_noops_are_silent() {
        let (mut s, _) = scheduler();
        let mut rx = s.bus().subscribe();
        s.pause();
        s.resume();
        s.stop();
        assert!(rx.try_recv().is_err());
        s.start();
        s.start();
        assert_eq!(rx.try_recv().unwrap().name(), "simulation-started");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn tick_is_a_noop_when_stopped() {
        let (mut s, _) = scheduler();
        s.inject_event(alert("a", 0));
        assert!(s.tick().is_none());
        assert_eq!(s.queue_length(), 1);
    }

    #[test]
    fn max_events_per_tick_defers_backlog() {
        let (s, _) = scheduler();
        let mut s = s.with_max_events_per_tick(2);
        for i in 0..5 {
            s.inject_event(alert(&format!("e{i}"), 0));
        }
        s.start();
        assert_eq!(s.tick().unwrap().processed.len(), 2);
        assert_eq!(s.tick().unwrap().processed.len(), 2);
        assert_eq!(s.tick().unwrap().processed.len(), 1);
        assert_eq!(s.queue_length(), 0);
    }

    #[test]
    fn processing_writes_audit_entries() {
        let (mut s, _) = scheduler();
        s.inject_event(alert("a", 0));
        s.start();
        s.tick();
        let summary = s.audit().summary();
        assert_eq!(summary.by_type.get("event"), Some(&1));
        assert_eq!(summary.by_type.get("response"), Some(&1));
        assert_eq!(summary.by_type.get("performance"), Some(&1));
        assert_eq!(s.world().alerts.len(), 1);

        // Idle ticks leave no performance trail.
        s.tick();
        assert_eq!(s.audit().by_type(LogType::Performance).len(), 1);
        assert_eq!(s.status().events_processed, 1);
    }

    #[test]
    fn unknown_scenario_leaves_state_untouched() {
        let (mut s, _) = scheduler();
        s.inject_event(alert("a", 0));
        assert!(matches!(
            s.load_scenario("missing"),
            Err(ScenarioError::UnknownScenario { .. })
        ));
        assert_eq!(s.queue_length(), 1);
        assert!(s.active_scenario().is_none());
    }

    #[test]
    fn malformed_scenario_json_is_a_failure_result() {
        let (mut s, _) = scheduler();
        assert!(s.load_scenario_json("{\"timeline\": 7}").is_err());
        assert!(s.scenarios().is_empty());
    }
}
