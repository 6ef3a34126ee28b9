//! Audit logger for the ground-operations simulator.
//!
//! [`AuditLog`] is an append-only, bounded trail of event, response,
//! compliance, error, and performance entries. It supports filtered
//! queries, summary statistics, and CSV, JSON, and checksummed audit
//! exports.

pub mod error;
pub mod export;
pub mod store;

pub use error::AuditError;
pub use export::{entry_checksum, fnv1a_32, LogSummary, AUDIT_CRITERIA};
pub use store::{AuditConfig, AuditLog, ResponseDetails, DEFAULT_MAX_ENTRIES};
