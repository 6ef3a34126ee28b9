//! The simulation driver: a single task that owns the [`Scheduler`].
//!
//! The driver runs a fixed-period tick and a command mailbox in one
//! `select!` loop. Every mutation of the scheduler happens on this task, so
//! no two ticks overlap and commands are serialised with ticks. Other tasks
//! talk to the scheduler through a cloneable [`SchedulerHandle`]; each call
//! is a closure shipped over the mailbox with a oneshot reply.

use std::time::Duration;

use groundops_audit::AuditError;
use groundops_types::{
    ComplianceStatus, SimulationEvent, SimulationLog, SimulationStatus, TestCaseResult,
    WorldState,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::library::{ScenarioError, ScenarioSummary};
use crate::scheduler::{ExportFormat, Scheduler};

/// A unit of work run on the driver task.
pub type Job = Box<dyn FnOnce(&mut Scheduler) + Send>;

/// Messages accepted by the driver.
pub enum Command {
    /// Run a closure against the scheduler.
    Execute(Job),
    /// Stop the driver loop and hand the scheduler back.
    Shutdown,
}

impl core::fmt::Debug for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Execute(_) => f.write_str("Execute(..)"),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Errors talking to the driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The driver task is gone; the command was not delivered.
    #[error("simulation driver is not running: {source}")]
    Closed {
        /// The undelivered command.
        #[from]
        source: mpsc::error::SendError<Command>,
    },

    /// The driver dropped the command without replying.
    #[error("simulation driver dropped the reply: {source}")]
    NoReply {
        /// The underlying receive error.
        #[from]
        source: oneshot::error::RecvError,
    },
}

/// Cloneable handle for talking to the driver.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Command>,
}

impl SchedulerHandle {
    /// Run `f` on the driver task and return its result.
    ///
    /// # Errors
    ///
    /// Returns a [`DriverError`] if the driver has shut down.
    pub async fn call<F, R>(&self, f: F) -> Result<R, DriverError>
    where
        F: FnOnce(&mut Scheduler) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |scheduler| {
            if reply_tx.send(f(scheduler)).is_err() {
                debug!("Caller went away before the reply");
            }
        });
        self.tx.send(Command::Execute(job)).await?;
        Ok(reply_rx.await?)
    }

    /// Start the simulation.
    pub async fn start(&self) -> Result<SimulationStatus, DriverError> {
        self.call(|s| {
            s.start();
            s.status()
        })
        .await
    }

    /// Pause the simulation.
    pub async fn pause(&self) -> Result<SimulationStatus, DriverError> {
        self.call(|s| {
            s.pause();
            s.status()
        })
        .await
    }

    /// Resume the simulation.
    pub async fn resume(&self) -> Result<SimulationStatus, DriverError> {
        self.call(|s| {
            s.resume();
            s.status()
        })
        .await
    }

    /// Stop the simulation.
    pub async fn stop(&self) -> Result<SimulationStatus, DriverError> {
        self.call(|s| {
            s.stop();
            s.status()
        })
        .await
    }

    /// Reset the simulation.
    pub async fn reset(&self) -> Result<SimulationStatus, DriverError> {
        self.call(|s| {
            s.reset();
            s.status()
        })
        .await
    }

    /// Change the time scale; returns the clamped value applied.
    pub async fn set_time_scale(&self, scale: f64) -> Result<f64, DriverError> {
        self.call(move |s| s.set_time_scale(scale)).await
    }

    /// Inject an event into the queue.
    pub async fn inject_event(&self, event: SimulationEvent) -> Result<usize, DriverError> {
        self.call(move |s| {
            s.inject_event(event);
            s.queue_length()
        })
        .await
    }

    /// Load a registered scenario by id.
    pub async fn load_scenario(
        &self,
        id: String,
    ) -> Result<Result<SimulationStatus, ScenarioError>, DriverError> {
        self.call(move |s| -> Result<SimulationStatus, ScenarioError> {
            s.load_scenario(&id)?;
            Ok(s.status())
        })
        .await
    }

    /// Parse, register, and load a scenario document.
    pub async fn load_scenario_json(
        &self,
        json: String,
    ) -> Result<Result<SimulationStatus, ScenarioError>, DriverError> {
        self.call(move |s| -> Result<SimulationStatus, ScenarioError> {
            s.load_scenario_json(&json)?;
            Ok(s.status())
        })
        .await
    }

    /// Status snapshot.
    pub async fn status(&self) -> Result<SimulationStatus, DriverError> {
        self.call(|s| s.status()).await
    }

    /// Copy of the live world state.
    pub async fn world(&self) -> Result<WorldState, DriverError> {
        self.call(|s| s.world().clone()).await
    }

    /// Aggregated compliance status.
    pub async fn compliance_status(&self) -> Result<ComplianceStatus, DriverError> {
        self.call(|s| s.compliance_status()).await
    }

    /// Results of the active scenario's compliance test cases.
    pub async fn test_case_results(&self) -> Result<Vec<TestCaseResult>, DriverError> {
        self.call(|s| s.evaluate_test_cases()).await
    }

    /// Registered scenarios.
    pub async fn scenarios(&self) -> Result<Vec<ScenarioSummary>, DriverError> {
        self.call(|s| s.scenarios()).await
    }

    /// The `limit` most recent audit entries, newest first.
    pub async fn recent_logs(&self, limit: usize) -> Result<Vec<SimulationLog>, DriverError> {
        self.call(move |s| s.recent_logs(limit)).await
    }

    /// Export the audit log.
    pub async fn export_logs(
        &self,
        format: ExportFormat,
    ) -> Result<Result<String, AuditError>, DriverError> {
        self.call(move |s| s.export_logs(format)).await
    }

    /// Ask the driver to stop its loop.
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.tx.send(Command::Shutdown).await?;
        Ok(())
    }
}

/// The task that owns the scheduler.
#[derive(Debug)]
pub struct SimulationDriver {
    scheduler: Scheduler,
    commands: mpsc::Receiver<Command>,
    tick_interval: Duration,
}

impl SimulationDriver {
    /// Spawn a driver on the current runtime.
    ///
    /// The join handle yields the scheduler back once the driver stops,
    /// either on [`SchedulerHandle::shutdown`] or when every handle has
    /// been dropped.
    pub fn spawn(
        scheduler: Scheduler,
        tick_interval_ms: u64,
        mailbox_capacity: usize,
    ) -> (SchedulerHandle, JoinHandle<Scheduler>) {
        let (tx, commands) = mpsc::channel(mailbox_capacity.max(1));
        let driver = Self {
            scheduler,
            commands,
            tick_interval: Duration::from_millis(tick_interval_ms.max(1)),
        };
        let join = tokio::spawn(driver.run());
        (SchedulerHandle { tx }, join)
    }

    async fn run(mut self) -> Scheduler {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            tick_interval_ms = u64::try_from(self.tick_interval.as_millis()).unwrap_or(u64::MAX),
            "Simulation driver started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.scheduler.tick() {
                        Some(report) if !report.processed.is_empty() => debug!(
                            current_time = report.current_time,
                            processed = report.processed.len(),
                            queue_length = report.queue_length,
                            "Tick processed events"
                        ),
                        _ => {}
                    }
                }
                command = self.commands.recv() => match command {
                    Some(Command::Execute(job)) => job(&mut self.scheduler),
                    Some(Command::Shutdown) | None => break,
                },
            }
        }

        info!(status = ?self.scheduler.status(), "Simulation driver stopped");
        self.scheduler
    }
}
