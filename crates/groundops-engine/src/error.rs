//! Error types for the simulator binary.
//!
//! [`EngineError`] wraps every failure mode of start-up and shutdown so
//! `main` can propagate with `?`.

/// Top-level error for the simulator binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: groundops_core::ConfigError,
    },

    /// A scenario could not be read or loaded.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: groundops_core::ScenarioError,
    },

    /// The driver task stopped answering.
    #[error("driver error: {source}")]
    Driver {
        /// The underlying driver error.
        #[from]
        source: groundops_core::DriverError,
    },

    /// The driver task panicked or was cancelled.
    #[error("driver task failed: {message}")]
    Join {
        /// Description of the join failure.
        message: String,
    },

    /// Observer API server failed.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: groundops_observer::ServerError,
    },
}
