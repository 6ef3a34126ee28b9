//! Identifiers for records the simulator generates itself.
//!
//! Violations, audit entries, and alerts get a UUID v7, which sorts by
//! creation time and serializes as a plain UUID string. Scenario-authored
//! events and world entities keep the string ids their authors chose and
//! never pass through here.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

macro_rules! generated_ids {
    ($($(#[$meta:meta])* $name:ident;)+) => {$(
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh time-ordered id.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Unix milliseconds embedded in the id, if it is a v7 UUID.
            pub fn created_at_ms(&self) -> Option<u64> {
                self.0.get_timestamp().map(|ts| {
                    let (secs, nanos) = ts.to_unix();
                    secs.saturating_mul(1_000)
                        .saturating_add(u64::from(nanos / 1_000_000))
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }
    )+};
}

generated_ids! {
    /// Id of a compliance violation.
    ViolationId;
    /// Id of an audit log entry.
    LogId;
    /// Id of an alert raised in the world state.
    AlertId;
}
