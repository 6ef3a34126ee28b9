//! The scenario library: every scenario the scheduler can load by id.
//!
//! Scenarios arrive either from a directory of `*.json` documents scanned
//! at start-up or as text uploaded at runtime. Parsing happens once, here;
//! a malformed document is reported and never reaches the scheduler.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use groundops_types::ScenarioConfig;
use serde::Serialize;
use tracing::{info, warn};

/// Errors that can occur while loading scenarios.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// No scenario with this id is registered.
    #[error("unknown scenario: {id}")]
    UnknownScenario {
        /// The requested id.
        id: String,
    },

    /// The document is not a valid scenario.
    #[error("invalid scenario document: {source}")]
    Parse {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// A scenario file or directory could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Listing entry for one registered scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    /// Scenario id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Number of timeline events.
    pub event_count: usize,
    /// Number of compliance test cases.
    pub test_case_count: usize,
}

impl From<&ScenarioConfig> for ScenarioSummary {
    fn from(scenario: &ScenarioConfig) -> Self {
        Self {
            id: scenario.id.clone(),
            name: scenario.name.clone(),
            description: scenario.description.clone(),
            event_count: scenario.timeline.len(),
            test_case_count: scenario.compliance_test_cases.len(),
        }
    }
}

/// Outcome of scanning a scenario directory.
#[derive(Debug, Default)]
pub struct DirectoryLoad {
    /// Ids of scenarios registered from the directory.
    pub loaded: Vec<String>,
    /// Files that could not be read or parsed.
    pub failed: Vec<(PathBuf, ScenarioError)>,
}

/// Registered scenarios keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ScenarioLibrary {
    scenarios: BTreeMap<String, ScenarioConfig>,
}

impl ScenarioLibrary {
    /// An empty library.
    pub const fn new() -> Self {
        Self {
            scenarios: BTreeMap::new(),
        }
    }

    /// Register a scenario, replacing any previous one with the same id.
    pub fn register(&mut self, scenario: ScenarioConfig) -> Option<ScenarioConfig> {
        self.scenarios.insert(scenario.id.clone(), scenario)
    }

    /// Parse a JSON document and register it, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Parse`] if the document is malformed.
    pub fn register_json(&mut self, json: &str) -> Result<String, ScenarioError> {
        let scenario = ScenarioConfig::from_json(json)?;
        let id = scenario.id.clone();
        if self.register(scenario).is_some() {
            info!(scenario_id = %id, "Scenario replaced");
        }
        Ok(id)
    }

    /// Look up a scenario by id.
    pub fn get(&self, id: &str) -> Option<&ScenarioConfig> {
        self.scenarios.get(id)
    }

    /// Look up a scenario by id, failing on an unknown id.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownScenario`] if `id` is not registered.
    pub fn require(&self, id: &str) -> Result<&ScenarioConfig, ScenarioError> {
        self.get(id).ok_or_else(|| ScenarioError::UnknownScenario { id: id.to_owned() })
    }

    /// Summaries of every registered scenario, ordered by id.
    pub fn list(&self) -> Vec<ScenarioSummary> {
        self.scenarios.values().map(ScenarioSummary::from).collect()
    }

    /// Number of registered scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Register every `*.json` document in `dir`.
    ///
    /// Unreadable or malformed files are collected in
    /// [`DirectoryLoad::failed`] and skipped; only a failure to list the
    /// directory itself is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Io`] if the directory cannot be read.
    pub async fn load_dir(&mut self, dir: &Path) -> Result<DirectoryLoad, ScenarioError> {
        let io_err = |source| ScenarioError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut report = DirectoryLoad::default();
        for path in paths {
            match read_scenario(&path).await {
                Ok(scenario) => {
                    info!(
                        scenario_id = %scenario.id,
                        events = scenario.timeline.len(),
                        path = %path.display(),
                        "Scenario registered"
                    );
                    report.loaded.push(scenario.id.clone());
                    self.register(scenario);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping scenario file");
                    report.failed.push((path, e));
                }
            }
        }
        Ok(report)
    }
}

async fn read_scenario(path: &Path) -> Result<ScenarioConfig, ScenarioError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(ScenarioConfig::from_json(&text)?)
}
