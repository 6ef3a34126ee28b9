//! Configuration loading and typed config structures for the simulator.
//!
//! The canonical configuration lives in `groundops-config.yaml` at the
//! project root. Every field has a default, so an empty document (or no
//! file at all) yields a working configuration.

use std::path::{Path, PathBuf};

use groundops_audit::AuditConfig;
use groundops_compliance::ValidatorConfig;
use serde::Deserialize;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "GROUNDOPS_CONFIG";

/// Environment variable overriding `scenarios.directory`.
pub const SCENARIO_DIR_ENV: &str = "GROUNDOPS_SCENARIO_DIR";

/// Environment variable overriding `observer.port`.
pub const OBSERVER_PORT_ENV: &str = "GROUNDOPS_OBSERVER_PORT";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid value for {variable}: {value}")]
    InvalidOverride {
        /// The environment variable.
        variable: &'static str,
        /// The rejected value.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulator configuration.
///
/// Mirrors the structure of `groundops-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GroundOpsConfig {
    /// Scheduler timing.
    #[serde(default)]
    pub simulation: SimulationSection,

    /// Compliance rule tunables.
    #[serde(default)]
    pub compliance: ValidatorConfig,

    /// Audit log retention.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Scenario library settings.
    #[serde(default)]
    pub scenarios: ScenarioSection,

    /// Observer HTTP server settings.
    #[serde(default)]
    pub observer: ObserverSection,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl GroundOpsConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `GROUNDOPS_SCENARIO_DIR` overrides `scenarios.directory`
    /// - `GROUNDOPS_OBSERVER_PORT` overrides `observer.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] if an override cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string and apply env overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a mapping.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply overrides looked up through `lookup`.
    ///
    /// Separated from [`parse`](Self::parse) so tests can supply variables
    /// without touching the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(SCENARIO_DIR_ENV) {
            self.scenarios.directory = PathBuf::from(dir);
        }
        if let Some(port) = lookup(OBSERVER_PORT_ENV) {
            self.observer.port = port
                .trim()
                .parse()
                .map_err(|_parse| ConfigError::InvalidOverride {
                    variable: OBSERVER_PORT_ENV,
                    value: port.clone(),
                })?;
        }
        Ok(())
    }
}

/// Scheduler timing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationSection {
    /// Real-time milliseconds between scheduler ticks.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Time scale applied at start-up.
    #[serde(default = "default_time_scale")]
    pub default_time_scale: f64,

    /// Maximum events drained per tick (0 = unlimited).
    #[serde(default)]
    pub max_events_per_tick: usize,

    /// Capacity of the notification broadcast channel.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    /// Capacity of the driver's command mailbox.
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            default_time_scale: default_time_scale(),
            max_events_per_tick: 0,
            notification_capacity: default_notification_capacity(),
            command_capacity: default_command_capacity(),
        }
    }
}

/// Scenario library configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScenarioSection {
    /// Directory scanned for `*.json` scenario documents at start-up.
    #[serde(default = "default_scenario_dir")]
    pub directory: PathBuf,

    /// Scenario to load once the library is populated.
    #[serde(default)]
    pub autoload: Option<String>,

    /// Whether to start the simulation right after `autoload`.
    #[serde(default)]
    pub auto_start: bool,
}

impl Default for ScenarioSection {
    fn default() -> Self {
        Self {
            directory: default_scenario_dir(),
            autoload: None,
            auto_start: false,
        }
    }
}

/// Observer HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ObserverSection {
    /// Whether to serve the observer API at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind host.
    #[serde(default = "default_observer_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_observer_port")]
    pub port: u16,
}

impl Default for ObserverSection {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_observer_host(),
            port: default_observer_port(),
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingSection {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_tick_interval_ms() -> u64 {
    100
}

const fn default_time_scale() -> f64 {
    1.0
}

const fn default_notification_capacity() -> usize {
    256
}

const fn default_command_capacity() -> usize {
    64
}

fn default_scenario_dir() -> PathBuf {
    PathBuf::from("scenarios")
}

const fn default_true() -> bool {
    true
}

fn default_observer_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GroundOpsConfig::default();
        assert_eq!(config.simulation.tick_interval_ms, 100);
        assert_eq!(config.simulation.max_events_per_tick, 0);
        assert_eq!(config.audit.max_entries, 10_000);
        assert_eq!(config.compliance.dal_a_response_ms, 100);
        assert_eq!(config.observer.port, 8080);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
simulation:
  tick_interval_ms: 50
  default_time_scale: 2.5
compliance:
  proximity_threshold: 75.0
audit:
  max_entries: 500
scenarios:
  directory: /srv/scenarios
  autoload: runway-incursion
  auto_start: true
logging:
  level: debug
  format: json
";
        let mut config: GroundOpsConfig = serde_yml::from_str(yaml).unwrap();
        config.apply_env_overrides(|_| None).unwrap();
        assert_eq!(config.simulation.tick_interval_ms, 50);
        assert!((config.simulation.default_time_scale - 2.5).abs() < f64::EPSILON);
        assert!((config.compliance.proximity_threshold - 75.0).abs() < f64::EPSILON);
        // Unspecified fields in a present section keep their defaults.
        assert_eq!(config.compliance.dal_b_response_ms, 500);
        assert_eq!(config.audit.max_entries, 500);
        assert_eq!(config.scenarios.autoload.as_deref(), Some("runway-incursion"));
        assert!(config.scenarios.auto_start);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.observer, ObserverSection::default());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let mut config = GroundOpsConfig::default();
        config.apply_env_overrides(|_| None).unwrap();
        assert_eq!(config, GroundOpsConfig::default());
        assert!(serde_yml::from_str::<GroundOpsConfig>("{}").is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = GroundOpsConfig::default();
        config
            .apply_env_overrides(|name| match name {
                SCENARIO_DIR_ENV => Some("/tmp/scn".to_owned()),
                OBSERVER_PORT_ENV => Some("9090".to_owned()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.scenarios.directory, PathBuf::from("/tmp/scn"));
        assert_eq!(config.observer.port, 9090);
    }

    #[test]
    fn bad_port_override_is_rejected() {
        let mut config = GroundOpsConfig::default();
        let result = config.apply_env_overrides(|name| {
            (name == OBSERVER_PORT_ENV).then(|| "not-a-port".to_owned())
        });
        assert!(matches!(result, Err(ConfigError::InvalidOverride { .. })));
    }
}
