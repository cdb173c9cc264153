//! Serializable simulation configuration.
//!
//! Replaces the reference module-level constants with one value loaded from
//! TOML. Every section is optional; missing sections fall back to the
//! reference constants.
//!
//! ```toml
//! seed = 42
//!
//! [population]
//! match_paper = false
//! min_per_category = 1
//! max_per_category = 10
//!
//! [[population.categories]]
//! name = "Loss_of_View"
//! count = 8
//!
//! [scenarios]
//! thresholds = [inf, 3.2, 3.1, 3.0]
//!
//! [scenarios.base]
//! max_failure = 0.05
//! max_time_slew = 0.0
//! time_weight = 0.2
//! detection_ratio = 0.0
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use threatsim_core::population::validate_population;
use threatsim_core::{
    paper_categories, plan_scenarios, reference_thresholds, AlertThreshold, CategorySpec,
    PlannedScenario, ScenarioConfig, ScenarioTable, SelectionMode,
};

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(String),
    #[error("invalid config: {}", problems.join("; "))]
    Invalid { problems: Vec<String> },
}

/// One configured category and its reference-table count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub count: usize,
}

/// Population section: category set and selection mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Use the per-category counts verbatim instead of drawing them.
    pub match_paper: bool,
    pub min_per_category: usize,
    pub max_per_category: usize,
    pub categories: Vec<CategoryEntry>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            match_paper: false,
            min_per_category: 1,
            max_per_category: 10,
            categories: paper_categories()
                .into_iter()
                .map(|s| CategoryEntry {
                    name: s.name,
                    count: s.paper_count,
                })
                .collect(),
        }
    }
}

impl PopulationConfig {
    pub fn selection_mode(&self) -> SelectionMode {
        if self.match_paper {
            SelectionMode::PaperMatched
        } else {
            SelectionMode::Randomized {
                min: self.min_per_category,
                max: self.max_per_category,
            }
        }
    }

    pub fn category_specs(&self) -> Vec<CategorySpec> {
        self.categories
            .iter()
            .map(|c| CategorySpec::new(c.name.clone(), c.count))
            .collect()
    }

    /// Expected size of each category under the selection mode.
    pub fn expected_counts(&self) -> Vec<(String, f64)> {
        let mode = self.selection_mode();
        self.category_specs()
            .iter()
            .map(|s| (s.name.clone(), mode.expected_count(s)))
            .collect()
    }
}

/// Scenario section: bounds per kind plus the alert-threshold list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenariosConfig {
    /// Entry 0 labels the base case, entry 1 the initial deployment; each
    /// further entry adds one steady-state scenario.
    pub thresholds: Vec<AlertThreshold>,
    pub base: ScenarioConfig,
    pub initial: ScenarioConfig,
    pub steady: ScenarioConfig,
}

impl Default for ScenariosConfig {
    fn default() -> Self {
        let table = ScenarioTable::reference();
        Self {
            thresholds: reference_thresholds(),
            base: table.base,
            initial: table.initial,
            steady: table.steady,
        }
    }
}

impl ScenariosConfig {
    pub fn table(&self) -> ScenarioTable {
        ScenarioTable {
            base: self.base,
            initial: self.initial,
            steady: self.steady,
        }
    }

    pub fn plan(&self) -> Vec<PlannedScenario> {
        plan_scenarios(&self.table(), &self.thresholds)
    }
}

/// Complete configuration of a simulation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed seed. Without one, each run draws a fresh seed and records it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub population: PopulationConfig,
    pub scenarios: ScenariosConfig,
}

impl SimulationConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML. Infinite thresholds use TOML's native `inf`.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut value =
            toml::Value::try_from(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        if let Some(thresholds) = value
            .get_mut("scenarios")
            .and_then(|s| s.get_mut("thresholds"))
            .and_then(toml::Value::as_array_mut)
        {
            for entry in thresholds.iter_mut() {
                let native = match entry.as_str() {
                    Some("inf") => f64::INFINITY,
                    Some("-inf") => f64::NEG_INFINITY,
                    _ => continue,
                };
                *entry = toml::Value::Float(native);
            }
        }
        toml::to_string_pretty(&value).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Check every section, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        if let Err(e) = validate_population(
            &self.population.category_specs(),
            &self.population.selection_mode(),
        ) {
            problems.push(format!("population: {e}"));
        }
        for (kind, cfg) in [
            ("base", &self.scenarios.base),
            ("initial", &self.scenarios.initial),
            ("steady", &self.scenarios.steady),
        ] {
            if let Err(e) = cfg.validate() {
                problems.push(format!("scenarios.{kind}: {e}"));
            }
        }
        if self.scenarios.thresholds.iter().any(|t| t.value().is_nan()) {
            problems.push("scenarios.thresholds: NaN threshold".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid { problems })
        }
    }

    /// Deterministic id: BLAKE3 of the canonical JSON form.
    ///
    /// Two runs with identical configs share the id; the seed is part of it.
    pub fn config_id(&self) -> Result<String, ConfigError> {
        let json =
            serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }

    /// Id of the simulated model alone: the config id with `seed` cleared.
    ///
    /// Trials key their per-trial seeds on this, so editing `seed` does not
    /// change a trials result.
    pub fn model_id(&self) -> Result<String, ConfigError> {
        SimulationConfig {
            seed: None,
            ..self.clone()
        }
        .config_id()
    }
}
