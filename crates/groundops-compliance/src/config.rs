//! Tunables for the compliance rule set.
//!
//! The engine builds a [`ValidatorConfig`] from the `compliance` section of
//! `groundops-config.yaml`; tests construct it directly.

use serde::Deserialize;

/// Configuration for the compliance validator and its built-in rules.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Width of the trailing status window in milliseconds (default: one hour).
    pub status_window_ms: u64,

    /// Minimum separation on each axis between a dispatched vehicle's target
    /// and any aircraft (default: 50 grid units).
    pub proximity_threshold: f64,

    /// Maximum handling latency for critical DAL A events (default: 100 ms).
    pub dal_a_response_ms: u64,

    /// Maximum handling latency for critical DAL B events (default: 500 ms).
    pub dal_b_response_ms: u64,

    /// Logging tag every DAL A event must carry (default: `audit-trail`).
    pub mandated_dal_a_log_tag: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            status_window_ms: 3_600_000,
            proximity_threshold: 50.0,
            dal_a_response_ms: 100,
            dal_b_response_ms: 500,
            mandated_dal_a_log_tag: String::from("audit-trail"),
        }
    }
}
