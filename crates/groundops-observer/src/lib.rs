//! Observer API server for the ground-operations simulator.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/notifications`) streaming every
//!   scheduler notification via [`tokio::sync::broadcast`]
//! - **REST endpoints** for status, world state, compliance, scenarios,
//!   and audit log queries and exports
//! - **Control endpoints** for lifecycle, time scale, scenario loading,
//!   and event injection
//!
//! Every handler talks to the simulation through a
//! [`SchedulerHandle`](groundops_core::SchedulerHandle), so requests are
//! serialised with ticks on the driver task.

pub mod control;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ObserverError;
pub use router::build_router;
pub use server::{bind, serve, ServerConfig, ServerError};
pub use state::AppState;
