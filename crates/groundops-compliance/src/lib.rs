//! Regulatory compliance rule engine for the ground-operations simulator.
//!
//! The validator is handed each processed event together with a read-only
//! view of the post-event world and produces zero or more
//! [`ComplianceViolation`](groundops_types::ComplianceViolation) records.
//! It keeps an append-only history from which the aggregated compliance
//! status is reduced on demand.
//!
//! # Modules
//!
//! - [`config`] -- [`ValidatorConfig`] tunables
//! - [`rules`] -- the [`ComplianceRule`] trait and the five built-in rules
//! - [`validator`] -- [`ComplianceValidator`]: rule runner and history

pub mod config;
pub mod rules;
pub mod validator;

pub use config::ValidatorConfig;
pub use rules::{ComplianceRule, Finding, RuleContext, RuleError};
pub use validator::{ComplianceValidator, RuleFailure, ValidationReport};
