//! Score aggregator: folds the post-update population into a [`ScenarioResult`].
//!
//! The reference pass fuses update and aggregation. Here they are two phases,
//! [`apply_scenario`] then [`aggregate`], joined by [`evaluate_scenario`].
//! Every exemplar is updated exactly once before any score is read.

use crate::domain::{Exemplar, Population, ScenarioConfig, ScenarioResult};
use crate::error::SimError;
use crate::rng::RandomSource;
use crate::update::step_exemplar;

/// Plain contribution `r·d`.
pub fn plain_contribution(e: &Exemplar) -> f64 {
    e.r * e.weight()
}

/// Time-weighted contribution `r·d − d·w·(t − 1)`. Zero for undetected
/// exemplars since both terms carry `d`.
pub fn time_contribution(e: &Exemplar, time_weight: f64) -> f64 {
    plain_contribution(e) - e.weight() * time_weight * (e.t - 1.0)
}

/// Phase 1: update every exemplar once, in category then exemplar order.
///
/// Parameters are validated first; on error the population is untouched.
pub fn apply_scenario<R: RandomSource + ?Sized>(
    population: &mut Population,
    config: &ScenarioConfig,
    rng: &mut R,
) -> Result<(), SimError> {
    config.validate()?;
    for exemplar in population.exemplars_mut() {
        step_exemplar(exemplar, config, rng);
    }
    Ok(())
}

/// Phase 2: per-category and total scores of the current state.
///
/// An empty population aggregates to all-zero totals.
pub fn aggregate(population: &Population, time_weight: f64) -> ScenarioResult {
    let mut result = ScenarioResult::default();
    for category in &population.categories {
        let (score, time_score) = category.exemplars.iter().fold((0.0, 0.0), |(s, st), e| {
            (s + plain_contribution(e), st + time_contribution(e, time_weight))
        });
        result.push_category(&category.name, score, time_score);
    }
    result
}

/// Update then aggregate: one full scenario step.
pub fn evaluate_scenario<R: RandomSource + ?Sized>(
    population: &mut Population,
    config: &ScenarioConfig,
    rng: &mut R,
) -> Result<ScenarioResult, SimError> {
    apply_scenario(population, config, rng)?;
    Ok(aggregate(population, config.time_weight))
}
