use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::SimError;

/// Suffix distinguishing a category's time-weighted score key.
pub const TIME_SUFFIX: &str = "_time";

/// Key under which a category's time-weighted score is stored.
pub fn time_key(category: &str) -> String {
    format!("{category}{TIME_SUFFIX}")
}

/// Parameters for one scenario step. Immutable per scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Bound on the per-step resilience perturbation.
    pub max_failure: f64,
    /// Bound on the per-step timing increment.
    pub max_time_slew: f64,
    /// Coefficient converting timing skew into a score penalty.
    pub time_weight: f64,
    /// Probability that a detected exemplar stays detected this step.
    pub detection_ratio: f64,
}

impl ScenarioConfig {
    pub fn new(
        max_failure: f64,
        max_time_slew: f64,
        time_weight: f64,
        detection_ratio: f64,
    ) -> Self {
        Self {
            max_failure,
            max_time_slew,
            time_weight,
            detection_ratio,
        }
    }

    /// Reject bounds that make the uniform draws or the Bernoulli draw
    /// ill-defined. Nothing is clamped.
    pub fn validate(&self) -> Result<(), SimError> {
        non_negative("max_failure", self.max_failure)?;
        non_negative("max_time_slew", self.max_time_slew)?;
        if !self.time_weight.is_finite() {
            return Err(SimError::parameter(
                "time_weight",
                self.time_weight,
                "must be finite",
            ));
        }
        if !(0.0..=1.0).contains(&self.detection_ratio) {
            return Err(SimError::parameter(
                "detection_ratio",
                self.detection_ratio,
                "must lie in [0, 1]",
            ));
        }
        Ok(())
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), SimError> {
    if !value.is_finite() {
        return Err(SimError::parameter(name, value, "must be finite"));
    }
    if value < 0.0 {
        return Err(SimError::parameter(name, value, "must be non-negative"));
    }
    Ok(())
}

/// Which row of the scenario-bounds table a step uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// No detection capability yet.
    Base,
    /// Detection just turned on.
    Initial,
    /// One per remaining alert threshold.
    Steady,
}

impl ScenarioKind {
    pub fn name(self) -> &'static str {
        match self {
            ScenarioKind::Base => "base case",
            ScenarioKind::Initial => "initial deployment",
            ScenarioKind::Steady => "steady state",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scores for one scenario, read-only once produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Category name → plain score `Σ r·d`.
    pub categories: BTreeMap<String, f64>,
    /// `"<category>_time"` → time-weighted score `Σ (r·d − d·w·(t − 1))`.
    pub categories_time: BTreeMap<String, f64>,
    /// Sum of the plain category scores.
    pub total: f64,
    /// Sum of the time-weighted category scores.
    pub total_time: f64,
}

impl ScenarioResult {
    pub fn score(&self, category: &str) -> Option<f64> {
        self.categories.get(category).copied()
    }

    pub fn time_score(&self, category: &str) -> Option<f64> {
        self.categories_time.get(&time_key(category)).copied()
    }

    /// Record one category's scores and fold them into the totals.
    pub fn push_category(&mut self, name: &str, score: f64, time_score: f64) {
        self.categories.insert(name.to_string(), score);
        self.categories_time.insert(time_key(name), time_score);
        self.total += score;
        self.total_time += time_score;
    }
}
