//! Simulation runner — wires together config, population, driver and series.
//!
//! Two entry points:
//! - `run_simulation()`: seeds from the config (or a fresh seed), used by the CLI.
//! - `run_with_source()`: takes an explicit random source. Used by trials and tests.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use threatsim_core::{
    generate_population, Population, RandomSource, RngSource, RunStatus, ScenarioDriver,
    ScenarioRecord, ScoreSeries, SimError, SimulationOutcome,
};

use crate::config::{ConfigError, SimulationConfig};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// How a run ended, in persistable form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompletionStatus {
    Complete,
    /// The sequence stopped at scenario `index`; the records before it are
    /// valid, the rest never ran.
    Incomplete {
        index: usize,
        label: String,
        error: String,
    },
}

impl CompletionStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, CompletionStatus::Complete)
    }
}

impl From<&RunStatus> for CompletionStatus {
    fn from(status: &RunStatus) -> Self {
        match status {
            RunStatus::Complete => CompletionStatus::Complete,
            RunStatus::Aborted {
                index,
                label,
                error,
            } => CompletionStatus::Incomplete {
                index: *index,
                label: label.clone(),
                error: error.to_string(),
            },
        }
    }
}

/// Complete result of one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRun {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub config_id: String,
    pub seed: u64,
    pub timestamp: NaiveDateTime,
    pub config: SimulationConfig,
    pub status: CompletionStatus,
    pub records: Vec<ScenarioRecord>,
    /// Final exemplar state after the last scenario that ran.
    pub population: Population,
    pub series: ScoreSeries,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl SimulationRun {
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }
}

/// Draw a seed for an unseeded run. Kept below 2^63 so it survives TOML.
pub fn fresh_seed() -> u64 {
    rand::random::<u64>() >> 1
}

/// Run one simulation.
///
/// The seed comes from the config when set; otherwise a fresh one is drawn
/// and recorded in the result so the run can be replayed.
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationRun, RunError> {
    let seed = config.seed.unwrap_or_else(fresh_seed);
    let mut rng = RngSource::seeded(seed);
    run_with_source(config, seed, &mut rng)
}

/// Run one simulation drawing from `rng`. `seed` is recorded as given.
///
/// Population generation failures are returned as errors. A failing scenario
/// step is not an error: the run comes back marked incomplete with the
/// records produced before the failure.
pub fn run_with_source<R: RandomSource + ?Sized>(
    config: &SimulationConfig,
    seed: u64,
    rng: &mut R,
) -> Result<SimulationRun, RunError> {
    let config_id = config.config_id()?;
    let outcome = simulate(config, rng)?;

    info!(
        config_id = %config_id,
        seed,
        scenarios = outcome.records.len(),
        complete = outcome.is_complete(),
        "simulation finished"
    );

    let series = ScoreSeries::from_records(&outcome.records, &outcome.population);
    Ok(SimulationRun {
        schema_version: SCHEMA_VERSION,
        config_id,
        seed,
        timestamp: chrono::Local::now().naive_local(),
        config: config.clone(),
        status: CompletionStatus::from(&outcome.status),
        records: outcome.records,
        population: outcome.population,
        series,
    })
}

/// Generate the population and drive the scenario plan. No bookkeeping.
pub(crate) fn simulate<R: RandomSource + ?Sized>(
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<SimulationOutcome, SimError> {
    let population = generate_population(
        &config.population.category_specs(),
        &config.population.selection_mode(),
        rng,
    )?;
    debug!(
        categories = population.category_count(),
        exemplars = population.exemplar_count(),
        "population generated"
    );

    let driver = ScenarioDriver::new(population, config.scenarios.plan());
    let outcome = driver.run_with(rng, |record| {
        debug!(
            index = record.index,
            label = %record.label,
            kind = %record.kind,
            total = record.result.total,
            total_time = record.result.total_time,
            "scenario complete"
        );
    });

    if let RunStatus::Aborted {
        index,
        label,
        error,
    } = &outcome.status
    {
        warn!(index, label = %label, error = %error, "scenario sequence aborted");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use threatsim_core::ScriptedSource;

    fn paper_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.population.match_paper = true;
        config
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let mut config = SimulationConfig::default();
        config.seed = Some(11);
        config.scenarios.base.detection_ratio = 0.9;

        let a = run_simulation(&config).unwrap();
        let b = run_simulation(&config).unwrap();
        assert_eq!(a.seed, 11);
        assert_eq!(a.records, b.records);
        assert_eq!(a.population, b.population);
        assert_eq!(a.config_id, b.config_id);
    }

    #[test]
    fn unseeded_runs_record_their_seed() {
        let run = run_simulation(&paper_config()).unwrap();
        assert!(run.seed < 1 << 63);

        let mut replay = paper_config();
        replay.seed = Some(run.seed);
        let again = run_simulation(&replay).unwrap();
        assert_eq!(run.records, again.records);
        assert_eq!(run.population, again.population);
    }

    #[test]
    fn reference_run_is_complete_with_series() {
        let run = run_simulation(&paper_config()).unwrap();
        assert!(run.is_complete());
        assert_eq!(run.schema_version, SCHEMA_VERSION);
        assert_eq!(run.records.len(), 8);
        assert_eq!(run.series.len(), 8);
        assert_eq!(run.series.exemplar_count, 42);
        assert_eq!(run.population.exemplar_count(), 42);
    }

    #[test]
    fn invalid_population_is_an_error() {
        let mut config = SimulationConfig::default();
        config.population.min_per_category = 9;
        config.population.max_per_category = 3;
        let err = run_with_source(&config, 0, &mut ScriptedSource::constant(0.5)).unwrap_err();
        assert!(matches!(
            err,
            RunError::Simulation(SimError::InvalidPopulationBounds { .. })
        ));
    }

    #[test]
    fn failing_step_yields_incomplete_run() {
        let mut config = paper_config();
        config.scenarios.steady.max_time_slew = -1.0;
        let run = run_with_source(&config, 0, &mut ScriptedSource::constant(0.5)).unwrap();

        assert!(!run.is_complete());
        assert_eq!(run.records.len(), 2);
        match &run.status {
            CompletionStatus::Incomplete { index, label, error } => {
                assert_eq!(*index, 2);
                assert_eq!(label, "3.1");
                assert!(error.contains("max_time_slew"));
            }
            CompletionStatus::Complete => panic!("expected incomplete run"),
        }
    }
}
