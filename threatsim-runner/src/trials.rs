//! Monte Carlo trials — the distribution of scores over repeated runs.
//!
//! Each trial generates a fresh population and runs the whole scenario
//! sequence with its own seed, derived from a master seed through
//! [`RngHierarchy`]. Trials are independent, so they run in parallel across
//! trials; inside a trial the sequence stays strictly sequential.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use threatsim_core::{expected_trajectory, RngHierarchy, SimError};

use crate::config::SimulationConfig;
use crate::runner::{simulate, RunError};

// ─── Configuration ───────────────────────────────────────────────────

/// Configuration for a batch of trials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialsConfig {
    /// Number of independent trials (default 1000).
    pub trials: usize,
    /// Master seed for sub-seed derivation.
    pub master_seed: u64,
    /// Run trials on the rayon pool.
    pub parallel: bool,
}

impl Default for TrialsConfig {
    fn default() -> Self {
        Self {
            trials: 1_000,
            master_seed: 42,
            parallel: true,
        }
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Distribution summary of one score across trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub mean: f64,
    pub std_dev: f64,
    pub p10: f64,
    pub median: f64,
    pub p90: f64,
}

/// Per-scenario statistics across trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStats {
    pub index: usize,
    pub label: String,
    /// Trials that produced this scenario.
    pub samples: usize,
    pub total: ScoreStats,
    pub total_time: ScoreStats,
    pub expected_total: f64,
    pub expected_total_time: f64,
}

/// Complete result of a batch of trials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialsResult {
    /// [`SimulationConfig::model_id`] of the simulated config.
    pub config_id: String,
    pub master_seed: u64,
    pub trials: usize,
    /// Trials whose scenario sequence stopped early.
    pub aborted_trials: usize,
    pub mean_exemplar_count: f64,
    /// True when the closed-form expectation is exact for this plan.
    pub expectation_exact: bool,
    pub scenarios: Vec<ScenarioStats>,
}

/// Scores one trial produced, in scenario order.
struct TrialSample {
    scores: Vec<(f64, f64)>,
    exemplar_count: usize,
    complete: bool,
}

// ─── Trial execution ─────────────────────────────────────────────────

/// Run `trials.trials` independent simulations of `config`.
///
/// The config's own `seed` is ignored: every trial seeds from the hierarchy,
/// keyed by [`SimulationConfig::model_id`], so configs differing only in
/// `seed` give identical results.
pub fn run_trials(
    config: &SimulationConfig,
    trials: &TrialsConfig,
) -> Result<TrialsResult, RunError> {
    config.validate()?;
    let config_id = config.model_id()?;
    let hierarchy = RngHierarchy::new(trials.master_seed);

    let one_trial = |trial: usize| -> Result<TrialSample, SimError> {
        let mut rng = hierarchy.source_for(&config_id, trial as u64);
        let outcome = simulate(config, &mut rng)?;
        Ok(TrialSample {
            scores: outcome
                .results()
                .map(|r| (r.total, r.total_time))
                .collect(),
            exemplar_count: outcome.population.exemplar_count(),
            complete: outcome.is_complete(),
        })
    };

    let samples: Vec<TrialSample> = if trials.parallel {
        (0..trials.trials)
            .into_par_iter()
            .map(one_trial)
            .collect::<Result<Vec<_>, _>>()?
    } else {
        (0..trials.trials)
            .map(one_trial)
            .collect::<Result<Vec<_>, _>>()?
    };

    let result = summarize(config, config_id, trials, &samples);
    info!(
        trials = result.trials,
        aborted = result.aborted_trials,
        scenarios = result.scenarios.len(),
        "trials finished"
    );
    Ok(result)
}

fn summarize(
    config: &SimulationConfig,
    config_id: String,
    trials: &TrialsConfig,
    samples: &[TrialSample],
) -> TrialsResult {
    let plan = config.scenarios.plan();
    let expected = expected_trajectory(&config.population.expected_counts(), &plan);

    let scenarios = plan
        .iter()
        .zip(&expected.scenarios)
        .map(|(step, exp)| {
            let (totals, time_totals): (Vec<f64>, Vec<f64>) = samples
                .iter()
                .filter_map(|s| s.scores.get(step.index).copied())
                .unzip();
            ScenarioStats {
                index: step.index,
                label: step.label.clone(),
                samples: totals.len(),
                total: score_stats(totals),
                total_time: score_stats(time_totals),
                expected_total: exp.total,
                expected_total_time: exp.total_time,
            }
        })
        .collect();

    let mean_exemplar_count = if samples.is_empty() {
        0.0
    } else {
        samples.iter().map(|s| s.exemplar_count as f64).sum::<f64>() / samples.len() as f64
    };

    TrialsResult {
        config_id,
        master_seed: trials.master_seed,
        trials: samples.len(),
        aborted_trials: samples.iter().filter(|s| !s.complete).count(),
        mean_exemplar_count,
        expectation_exact: expected.clamp_free,
        scenarios,
    }
}

// ─── Statistics ──────────────────────────────────────────────────────

fn score_stats(mut values: Vec<f64>) -> ScoreStats {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = values.len();
    let mean = if n == 0 {
        0.0
    } else {
        values.iter().sum::<f64>() / n as f64
    };
    let std_dev = if n > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
        (ss / (n - 1) as f64).sqrt()
    } else {
        0.0
    };

    ScoreStats {
        mean,
        std_dev,
        p10: percentile_sorted(&values, 10.0),
        median: percentile_sorted(&values, 50.0),
        p90: percentile_sorted(&values, 90.0),
    }
}

/// Percentile of a sorted slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
