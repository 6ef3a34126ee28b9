//! The compliance validator: runs every rule against a processed event and
//! keeps the append-only violation history.
//!
//! Rule evaluation is isolated per rule. A rule that returns an error is
//! reported in the [`ValidationReport`] and the remaining rules still run,
//! mirroring the dispatcher's handler isolation.

use std::collections::{BTreeMap, BTreeSet};

use groundops_types::{
    ComplianceStatus, ComplianceTestCase, ComplianceViolation, DalLevel, OverallStatus,
    Severity, SimulationEvent, TestCaseResult, ViolationId, WorldState,
};
use tracing::{debug, warn};

use crate::config::ValidatorConfig;
use crate::rules::{self, ComplianceRule, RuleContext};

/// A rule that failed to reach a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    /// Name of the failing rule.
    pub rule: &'static str,
    /// Error message.
    pub message: String,
}

/// Result of validating a single event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Violations recorded for the event, in rule order.
    pub violations: Vec<ComplianceViolation>,
    /// Rules that errored.
    pub failures: Vec<RuleFailure>,
}

/// Evaluates compliance rules and aggregates their history.
pub struct ComplianceValidator {
    /// Rules in evaluation order.
    rules: Vec<Box<dyn ComplianceRule>>,
    /// Every violation recorded since construction or the last clear.
    history: Vec<ComplianceViolation>,
    /// Rule tunables.
    config: ValidatorConfig,
}

impl core::fmt::Debug for ComplianceValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let rule_names: Vec<&str> = self.rules.iter().map(|r| r.name()).collect();
        f.debug_struct("ComplianceValidator")
            .field("rules", &rule_names)
            .field("history_len", &self.history.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for ComplianceValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl ComplianceValidator {
    /// Create a validator with the built-in rule set.
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            rules: rules::default_rules(),
            history: Vec::new(),
            config,
        }
    }

    /// Create a validator with an explicit rule set.
    pub fn with_rules(config: ValidatorConfig, rules: Vec<Box<dyn ComplianceRule>>) -> Self {
        Self {
            rules,
            history: Vec::new(),
            config,
        }
    }

    /// Append a rule to the end of the evaluation order.
    pub fn register_rule(&mut self, rule: Box<dyn ComplianceRule>) {
        self.rules.push(rule);
    }

    /// The active configuration.
    pub const fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Evaluate every rule against `event` and the post-event `world`.
    ///
    /// `measured_latency_ms` is the wall-clock dispatch time and `now_ms` the
    /// wall-clock timestamp stamped on new violations.
    pub fn validate(
        &mut self,
        event: &SimulationEvent,
        world: &WorldState,
        measured_latency_ms: u64,
        now_ms: i64,
    ) -> ValidationReport {
        let ctx = RuleContext {
            event,
            world,
            measured_latency_ms,
            config: &self.config,
        };

        let mut report = ValidationReport::default();
        for rule in &self.rules {
            match rule.evaluate(&ctx) {
                Ok(Some(finding)) => {
                    debug!(
                        event_id = %event.id,
                        rule = rule.name(),
                        severity = finding.severity.as_str(),
                        "Compliance rule fired"
                    );
                    report.violations.push(ComplianceViolation {
                        id: ViolationId::new(),
                        timestamp: now_ms,
                        regulation: rule.regulation().to_owned(),
                        description: finding.description,
                        severity: finding.severity,
                        event_id: event.id.clone(),
                        dal_level: event.dal_level,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(
                        event_id = %event.id,
                        rule = rule.name(),
                        error = %e,
                        "Compliance rule failed"
                    );
                    report.failures.push(RuleFailure {
                        rule: rule.name(),
                        message: e.to_string(),
                    });
                }
            }
        }

        self.history.extend(report.violations.iter().cloned());
        report
    }

    /// Every recorded violation, oldest first.
    pub fn history(&self) -> &[ComplianceViolation] {
        &self.history
    }

    /// Forget all recorded violations.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Aggregate the history over the trailing window ending at `now_ms`.
    ///
    /// This is a pure reduction: calling it twice with the same history and
    /// `now_ms` yields identical results.
    pub fn status(&self, now_ms: i64) -> ComplianceStatus {
        let window = i64::try_from(self.config.status_window_ms).unwrap_or(i64::MAX);
        let since = now_ms.saturating_sub(window);

        let mut status = ComplianceStatus {
            overall_status: OverallStatus::Compliant,
            window_ms: self.config.status_window_ms,
            total_violations: 0,
            level_a_violations: 0,
            level_b_violations: 0,
            critical_violations: 0,
            by_regulation: BTreeMap::new(),
        };
        let mut critical_level_a = false;

        for violation in self.history.iter().filter(|v| v.timestamp >= since) {
            status.total_violations = status.total_violations.saturating_add(1);
            match violation.dal_level {
                DalLevel::A => {
                    status.level_a_violations = status.level_a_violations.saturating_add(1);
                }
                DalLevel::B => {
                    status.level_b_violations = status.level_b_violations.saturating_add(1);
                }
            }
            if violation.severity == Severity::Critical {
                status.critical_violations = status.critical_violations.saturating_add(1);
                critical_level_a |= violation.dal_level == DalLevel::A;
            }
            let count = status
                .by_regulation
                .entry(violation.regulation.clone())
                .or_insert(0);
            *count = count.saturating_add(1);
        }

        status.overall_status = if critical_level_a {
            OverallStatus::Violation
        } else if status.total_violations > 0 {
            OverallStatus::Warning
        } else {
            OverallStatus::Compliant
        };
        status
    }

    /// Check scenario test cases against the recorded history.
    ///
    /// A case passes when the set of regulations violated by its event equals
    /// the expected set.
    pub fn evaluate_test_cases(&self, cases: &[ComplianceTestCase]) -> Vec<TestCaseResult> {
        cases
            .iter()
            .map(|case| {
                let observed: BTreeSet<&str> = self
                    .history
                    .iter()
                    .filter(|v| v.event_id == case.event_id)
                    .map(|v| v.regulation.as_str())
                    .collect();
                let expected: BTreeSet<&str> =
                    case.expected_regulations.iter().map(String::as_str).collect();
                TestCaseResult {
                    test_case_id: case.id.clone(),
                    event_id: case.event_id.clone(),
                    expected: expected.iter().map(|s| (*s).to_owned()).collect(),
                    observed: observed.iter().map(|s| (*s).to_owned()).collect(),
                    passed: expected == observed,
                }
            })
            .collect()
    }
}
