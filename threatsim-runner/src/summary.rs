//! Run summary: the headline numbers printed after a run.

use serde::{Deserialize, Serialize};

use crate::runner::SimulationRun;

/// Index of the initial-deployment scenario.
pub const INITIAL_SCENARIO: usize = 1;

/// Index the score drop `S_δ` is measured to.
pub const DELTA_SCENARIO: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub complete: bool,
    pub scenarios_run: usize,
    pub exemplar_count: usize,
    pub peak_total: Option<f64>,
    pub peak_time_total: Option<f64>,
    pub initial_total: Option<f64>,
    pub initial_time_total: Option<f64>,
    /// `S_δ = total[1] − total[3]`, when four scenarios ran.
    pub score_delta: Option<f64>,
}

impl RunSummary {
    pub fn from_run(run: &SimulationRun) -> Self {
        let series = &run.series;
        Self {
            seed: run.seed,
            complete: run.is_complete(),
            scenarios_run: series.len(),
            exemplar_count: series.exemplar_count,
            peak_total: series.peak_total(),
            peak_time_total: series.peak_time_total(),
            initial_total: series.totals.get(INITIAL_SCENARIO).copied(),
            initial_time_total: series.time_totals.get(INITIAL_SCENARIO).copied(),
            score_delta: series.delta(INITIAL_SCENARIO, DELTA_SCENARIO),
        }
    }
}
