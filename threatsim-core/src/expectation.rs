//! Closed-form expectation of the scenario sequence.
//!
//! Every exemplar starts at `{1, 1, 1}` and the three update rules draw
//! independently, so per exemplar after `k` steps:
//!
//! - `E[r] = 1 − Σ mf_i / 2`, `Var[r] = Σ mf_i² / 12`
//! - `E[t] = 1 + Σ slew_i / 2`, `Var[t] = Σ slew_i² / 12`
//! - `P(d = 1) = Π ratio_i`
//!
//! and `E[r·d] = E[r]·P(d)`. These hold exactly while the zero clamp on `r`
//! cannot bind, i.e. while `Σ mf_i ≤ 1`; [`ExpectedTrajectory::clamp_free`]
//! reports whether that held for the whole plan.

use serde::{Deserialize, Serialize};

use crate::driver::PlannedScenario;

/// Expected scores of one category after one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedCategory {
    pub name: String,
    pub score: f64,
    pub time_score: f64,
}

/// Expected scores after one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedScores {
    pub index: usize,
    pub label: String,
    pub categories: Vec<ExpectedCategory>,
    pub total: f64,
    pub total_time: f64,
    /// Standard deviation of `total` for fixed category sizes.
    pub total_std: f64,
    /// Standard deviation of `total_time` for fixed category sizes.
    pub total_time_std: f64,
}

/// Expected scores for every scenario of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedTrajectory {
    pub scenarios: Vec<ExpectedScores>,
    /// True when the lower clamp on `r` never binds, making the figures exact.
    pub clamp_free: bool,
}

/// Moments of one exemplar's state.
#[derive(Debug, Clone, Copy)]
struct Moments {
    r_mean: f64,
    r_var: f64,
    skew_mean: f64,
    skew_var: f64,
    p_detected: f64,
}

impl Moments {
    fn fresh() -> Self {
        Self {
            r_mean: 1.0,
            r_var: 0.0,
            skew_mean: 0.0,
            skew_var: 0.0,
            p_detected: 1.0,
        }
    }

    /// Per-exemplar mean and variance of the plain contribution `r·d`.
    fn plain(&self) -> (f64, f64) {
        let mean = self.r_mean * self.p_detected;
        let second = (self.r_var + self.r_mean * self.r_mean) * self.p_detected;
        (mean, second - mean * mean)
    }

    /// Per-exemplar mean and variance of `d·(r − w·(t − 1))`.
    fn timed(&self, w: f64) -> (f64, f64) {
        let inner_mean = self.r_mean - w * self.skew_mean;
        let r_second = self.r_var + self.r_mean * self.r_mean;
        let skew_second = self.skew_var + self.skew_mean * self.skew_mean;
        let inner_second = r_second - 2.0 * w * self.r_mean * self.skew_mean + w * w * skew_second;
        let mean = self.p_detected * inner_mean;
        (mean, self.p_detected * inner_second - mean * mean)
    }
}

/// Expected trajectory for categories of the given (expected) sizes.
pub fn expected_trajectory(categories: &[(String, f64)], plan: &[PlannedScenario]) -> ExpectedTrajectory {
    let mut m = Moments::fresh();
    let mut worst_r = 1.0_f64;
    let mut scenarios = Vec::with_capacity(plan.len());

    for step in plan {
        let cfg = &step.config;
        m.r_mean -= cfg.max_failure / 2.0;
        m.r_var += cfg.max_failure * cfg.max_failure / 12.0;
        m.skew_mean += cfg.max_time_slew / 2.0;
        m.skew_var += cfg.max_time_slew * cfg.max_time_slew / 12.0;
        m.p_detected *= cfg.detection_ratio;
        worst_r -= cfg.max_failure;

        let (plain_mean, plain_var) = m.plain();
        let (timed_mean, timed_var) = m.timed(cfg.time_weight);
        let n: f64 = categories.iter().map(|(_, count)| count).sum();

        scenarios.push(ExpectedScores {
            index: step.index,
            label: step.label.clone(),
            categories: categories
                .iter()
                .map(|(name, count)| ExpectedCategory {
                    name: name.clone(),
                    score: count * plain_mean,
                    time_score: count * timed_mean,
                })
                .collect(),
            total: n * plain_mean,
            total_time: n * timed_mean,
            total_std: (n * plain_var.max(0.0)).sqrt(),
            total_time_std: (n * timed_var.max(0.0)).sqrt(),
        });
    }

    ExpectedTrajectory {
        scenarios,
        clamp_free: worst_r >= 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScenarioConfig;
    use crate::driver::{plan_scenarios, reference_thresholds, ScenarioTable};

    fn cats(n: f64) -> Vec<(String, f64)> {
        vec![("A".to_string(), n)]
    }

    #[test]
    fn pass_through_plan_keeps_unit_scores() {
        let cfg = ScenarioConfig::new(0.0, 0.0, 0.2, 1.0);
        let table = ScenarioTable { base: cfg, initial: cfg, steady: cfg };
        let plan = plan_scenarios(&table, &reference_thresholds());
        let traj = expected_trajectory(&cats(4.0), &plan);

        assert!(traj.clamp_free);
        for s in &traj.scenarios {
            assert_eq!(s.total, 4.0);
            assert_eq!(s.total_time, 4.0);
            assert_eq!(s.total_std, 0.0);
        }
    }

    #[test]
    fn zero_base_ratio_zeroes_everything_after() {
        let plan = plan_scenarios(&ScenarioTable::reference(), &reference_thresholds());
        let traj = expected_trajectory(&cats(42.0), &plan);
        assert!(traj.scenarios.iter().all(|s| s.total == 0.0 && s.total_time == 0.0));
        assert!(traj.clamp_free);
    }

    #[test]
    fn one_step_matches_hand_computation() {
        let cfg = ScenarioConfig::new(0.1, 1.0, 0.2, 0.5);
        let table = ScenarioTable { base: cfg, initial: cfg, steady: cfg };
        let plan = plan_scenarios(&table, &[]);
        let traj = expected_trajectory(&cats(10.0), &plan);

        let first = &traj.scenarios[0];
        // E[r] = 0.95, P(d) = 0.5, E[t - 1] = 0.5
        assert!((first.total - 10.0 * 0.95 * 0.5).abs() < 1e-12);
        assert!((first.total_time - 10.0 * 0.5 * (0.95 - 0.2 * 0.5)).abs() < 1e-12);
        assert_eq!(first.categories[0].name, "A");

        let second = &traj.scenarios[1];
        assert!((second.total - 10.0 * 0.9 * 0.25).abs() < 1e-12);
    }

    #[test]
    fn clamp_flag_trips_when_failure_budget_exceeds_one() {
        let cfg = ScenarioConfig::new(0.3, 0.0, 0.2, 1.0);
        let table = ScenarioTable { base: cfg, initial: cfg, steady: cfg };
        let plan = plan_scenarios(&table, &reference_thresholds());
        assert!(!expected_trajectory(&cats(1.0), &plan).clamp_free);
    }
}
