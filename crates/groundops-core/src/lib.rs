//! Scheduler, dispatcher, and driver for the ground-operations simulator.
//!
//! This crate owns the simulation loop: scenarios are loaded from the
//! [`library`], events are ordered and timed by the [`scheduler`], applied
//! to world state by the [`dispatcher`], and the whole thing is driven by a
//! single task in [`driver`].
//!
//! # Modules
//!
//! - [`clock`] -- monotonic and manual wall clocks
//! - [`config`] -- `groundops-config.yaml` loading
//! - [`dispatcher`] -- handler registry and the per-event fold
//! - [`handlers`] -- the nine built-in event handlers
//! - [`library`] -- scenario registry and directory loading
//! - [`notifications`] -- the broadcast [`NotificationBus`]
//! - [`scheduler`] -- the [`Scheduler`] state machine
//! - [`driver`] -- [`SimulationDriver`] and [`SchedulerHandle`]

pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod driver;
pub mod handlers;
pub mod library;
pub mod notifications;
pub mod scheduler;

pub use clock::{ManualClock, MonotonicClock, WallClock};
pub use config::{ConfigError, GroundOpsConfig, LogFormat};
pub use dispatcher::{DispatchOutcome, Dispatcher, EventHandler, HandlerError, HandlerFailure};
pub use driver::{Command, DriverError, SchedulerHandle, SimulationDriver};
pub use library::{DirectoryLoad, ScenarioError, ScenarioLibrary, ScenarioSummary};
pub use notifications::NotificationBus;
pub use scheduler::{
    clamp_time_scale, ExportFormat, Scheduler, TickReport, MAX_TIME_SCALE, MIN_TIME_SCALE,
};
