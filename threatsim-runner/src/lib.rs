//! ThreatSim Runner — configuration, simulation runs, artifacts, trials.
//!
//! This crate builds on `threatsim-core` to provide:
//! - TOML configuration with the reference constants as defaults
//! - Single-run orchestration with structured `tracing` events
//! - JSON/CSV/Markdown artifact export and reload
//! - Monte Carlo trials with per-trial derived seeds
//! - Run summaries for console output

pub mod config;
pub mod export;
pub mod runner;
pub mod summary;
pub mod trials;

pub use config::{CategoryEntry, ConfigError, PopulationConfig, ScenariosConfig, SimulationConfig};
pub use export::{
    export_json, export_scores_csv, export_trials_csv, export_trials_json, generate_report,
    import_json, load_artifacts, save_artifacts,
};
pub use runner::{
    run_simulation, run_with_source, CompletionStatus, RunError, SimulationRun, SCHEMA_VERSION,
};
pub use summary::RunSummary;
pub use trials::{run_trials, ScenarioStats, ScoreStats, TrialsConfig, TrialsResult};
