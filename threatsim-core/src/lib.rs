//! ThreatSim Core — stochastic state evolution and threat-score aggregation.
//!
//! This crate contains the simulation engine:
//! - Domain types (exemplars, categories, scenario parameters and results)
//! - Population generator (paper-matched or randomized category sizes)
//! - State updater (resilience drift, timing skew, sticky detection ratchet)
//! - Score aggregator (plain and time-weighted per-category scores)
//! - Scenario driver (base → initial deployment → one step per threshold)
//! - Closed-form expectation and plotting series derived from a run
//!
//! The core does no I/O and no logging. Randomness is injected through
//! [`rng::RandomSource`].

pub mod aggregate;
pub mod domain;
pub mod driver;
pub mod error;
pub mod expectation;
pub mod population;
pub mod rng;
pub mod series;
pub mod update;

pub use aggregate::{aggregate, apply_scenario, evaluate_scenario};
pub use domain::{
    AlertThreshold, Category, Exemplar, Population, ScenarioConfig, ScenarioKind, ScenarioResult,
};
pub use driver::{
    plan_scenarios, reference_thresholds, PlannedScenario, RunStatus, ScenarioDriver,
    ScenarioRecord, ScenarioTable, SimulationOutcome,
};
pub use error::SimError;
pub use expectation::{expected_trajectory, ExpectedScores, ExpectedTrajectory};
pub use population::{generate_population, paper_categories, CategorySpec, SelectionMode};
pub use rng::{RandomSource, RngHierarchy, RngSource, ScriptedSource};
pub use series::{CategorySeries, ScoreSeries};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: run data can move to worker threads for
    /// parallel trials.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Exemplar>();
        require_sync::<Exemplar>();
        require_send::<Population>();
        require_sync::<Population>();
        require_send::<ScenarioConfig>();
        require_sync::<ScenarioConfig>();
        require_send::<ScenarioResult>();
        require_sync::<ScenarioResult>();
        require_send::<ScenarioRecord>();
        require_sync::<ScenarioRecord>();
        require_send::<SimulationOutcome>();
        require_sync::<SimulationOutcome>();
        require_send::<ScenarioDriver>();
        require_sync::<ScenarioDriver>();
        require_send::<SimError>();
        require_sync::<SimError>();
        require_send::<RngHierarchy>();
        require_sync::<RngHierarchy>();
        require_send::<RngSource<rand::rngs::StdRng>>();
        require_send::<ScoreSeries>();
        require_sync::<ScoreSeries>();
    }

    /// The updater only sees a `RandomSource`, never a concrete generator.
    #[test]
    fn updater_accepts_trait_objects() {
        let mut scripted = ScriptedSource::constant(0.5);
        let source: &mut dyn RandomSource = &mut scripted;
        let mut e = Exemplar::fresh();
        update::step_exemplar(&mut e, &ScenarioConfig::new(0.1, 1.0, 0.2, 1.0), source);
        assert_eq!(e.t, 1.5);
    }
}
