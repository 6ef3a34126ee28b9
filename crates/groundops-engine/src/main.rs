//! Simulator binary for ground operations.
//!
//! Wires the scenario library, scheduler, compliance validator, audit log,
//! driver task, and observer API together, then runs until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `groundops-config.yaml` (or `$GROUNDOPS_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the notification bus, validator, and audit log
//! 4. Populate the scenario library from the scenario directory
//! 5. Build the scheduler and spawn the driver task
//! 6. Autoload (and optionally start) the configured scenario
//! 7. Serve the observer API until shutdown
//! 8. Stop the driver and log a run summary

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use groundops_audit::AuditLog;
use groundops_compliance::ComplianceValidator;
use groundops_core::config::CONFIG_PATH_ENV;
use groundops_core::{
    GroundOpsConfig, LogFormat, MonotonicClock, NotificationBus, ScenarioLibrary, Scheduler,
    SchedulerHandle, SimulationDriver,
};
use groundops_observer::{bind, serve, AppState, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Configuration file read when `$GROUNDOPS_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "groundops-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step fails or the driver task
/// dies.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration. Logging is not up yet, so report where it came
    //    from once the subscriber is installed.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config);
    info!(source = %config_source, "groundops-engine starting");
    info!(
        tick_interval_ms = config.simulation.tick_interval_ms,
        default_time_scale = config.simulation.default_time_scale,
        max_events_per_tick = config.simulation.max_events_per_tick,
        audit_max_entries = config.audit.max_entries,
        "Configuration loaded"
    );

    // 3. Shared infrastructure.
    let bus = NotificationBus::new(config.simulation.notification_capacity);
    let validator = ComplianceValidator::new(config.compliance.clone());
    let audit = AuditLog::new(config.audit.clone());

    // 4. Scenario library.
    let library = load_library(&config).await;
    info!(scenarios = library.len(), "Scenario library ready");

    // 5. Scheduler and driver.
    let scheduler = Scheduler::new(Arc::new(MonotonicClock::new()), bus.clone())
        .with_validator(validator)
        .with_audit_log(audit)
        .with_library(library)
        .with_time_scale(config.simulation.default_time_scale)
        .with_max_events_per_tick(config.simulation.max_events_per_tick);
    let (handle, driver) = SimulationDriver::spawn(
        scheduler,
        config.simulation.tick_interval_ms,
        config.simulation.command_capacity,
    );

    // 6. Autoload.
    autoload(&config, &handle).await?;

    // 7. Observer API, or just wait for Ctrl-C.
    if config.observer.enabled {
        let listener = bind(&ServerConfig::from(&config.observer))
            .await
            .map_err(EngineError::from)?;
        let state = Arc::new(AppState::new(handle.clone(), bus));
        serve(listener, state, shutdown_signal())
            .await
            .map_err(EngineError::from)?;
    } else {
        info!("Observer disabled; running until Ctrl-C");
        shutdown_signal().await;
    }

    // 8. Shutdown and summary.
    handle.shutdown().await.map_err(EngineError::from)?;
    let scheduler = driver.await.map_err(|e| EngineError::Join {
        message: format!("{e}"),
    })?;

    let status = scheduler.status();
    let compliance = scheduler.compliance_status();
    let test_cases = scheduler.evaluate_test_cases();
    let passed = test_cases.iter().filter(|t| t.passed).count();
    info!(
        active_scenario = status.active_scenario.as_deref().unwrap_or("none"),
        current_time = status.current_time,
        events_processed = status.events_processed,
        queue_length = status.queue_length,
        audit_entries = scheduler.audit().len(),
        audit_evicted = scheduler.audit().evicted(),
        overall_compliance = ?compliance.overall_status,
        test_cases = test_cases.len(),
        test_cases_passed = passed,
        "groundops-engine stopped"
    );

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level` from the configuration.
fn init_tracing(config: &GroundOpsConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Load configuration from `$GROUNDOPS_CONFIG` or `groundops-config.yaml`.
///
/// A missing file yields defaults; a file that exists but does not parse
/// is an error.
fn load_config() -> Result<(GroundOpsConfig, String), EngineError> {
    let path = std::env::var(CONFIG_PATH_ENV)
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = GroundOpsConfig::from_file(&path)?;
        Ok((config, path.display().to_string()))
    } else {
        let mut config = GroundOpsConfig::default();
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok((config, String::from("defaults")))
    }
}

/// Register every scenario in the configured directory.
///
/// A missing directory is not fatal: scenarios can still be uploaded
/// through the observer API.
async fn load_library(config: &GroundOpsConfig) -> ScenarioLibrary {
    let mut library = ScenarioLibrary::new();
    let dir = &config.scenarios.directory;
    match library.load_dir(dir).await {
        Ok(report) => {
            info!(
                directory = %dir.display(),
                loaded = report.loaded.len(),
                failed = report.failed.len(),
                "Scenario directory scanned"
            );
        }
        Err(e) => warn!(directory = %dir.display(), error = %e, "Scenario directory unavailable"),
    }
    library
}

/// Load `scenarios.autoload` and start it when `scenarios.auto_start` is set.
async fn autoload(config: &GroundOpsConfig, handle: &SchedulerHandle) -> Result<(), EngineError> {
    let Some(id) = config.scenarios.autoload.clone() else {
        return Ok(());
    };
    let status = handle.load_scenario(id).await??;
    info!(
        scenario_id = status.active_scenario.as_deref().unwrap_or_default(),
        queue_length = status.queue_length,
        time_scale = status.time_scale,
        "Scenario autoloaded"
    );
    if config.scenarios.auto_start {
        let status = handle.start().await?;
        info!(state = ?status.state, "Simulation auto-started");
    }
    Ok(())
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C; shutting down"),
    }
}
