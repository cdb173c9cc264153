//! Scenario driver: runs the fixed scenario sequence against one population.
//!
//! The sequence is strictly linear:
//! 1. base case (threshold entry 0),
//! 2. initial deployment (threshold entry 1),
//! 3. one steady-state scenario per remaining threshold entry.
//!
//! Each scenario reads the state the previous one left behind, so scenarios
//! never run concurrently. The first failing step aborts the rest; records
//! produced before it stay valid.

use serde::{Deserialize, Serialize};

use crate::aggregate::evaluate_scenario;
use crate::domain::{AlertThreshold, Population, ScenarioConfig, ScenarioKind, ScenarioResult};
use crate::error::SimError;
use crate::rng::RandomSource;

/// Scenario bounds for each kind of step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioTable {
    pub base: ScenarioConfig,
    pub initial: ScenarioConfig,
    pub steady: ScenarioConfig,
}

impl ScenarioTable {
    /// The reference bounds: small failure and no time slew with detection
    /// off for the base case, larger bounds afterwards with an initial
    /// detection ratio of 0.3 settling to 0.2.
    pub fn reference() -> Self {
        Self {
            base: ScenarioConfig::new(0.05, 0.0, 0.2, 0.0),
            initial: ScenarioConfig::new(0.1, 1.0, 0.2, 0.3),
            steady: ScenarioConfig::new(0.1, 1.0, 0.2, 0.2),
        }
    }

    pub fn for_kind(&self, kind: ScenarioKind) -> &ScenarioConfig {
        match kind {
            ScenarioKind::Base => &self.base,
            ScenarioKind::Initial => &self.initial,
            ScenarioKind::Steady => &self.steady,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.base.validate()?;
        self.initial.validate()?;
        self.steady.validate()
    }
}

/// The reference alert thresholds: `∞` then 3.2 down to 2.6.
pub fn reference_thresholds() -> Vec<AlertThreshold> {
    [f64::INFINITY, 3.2, 3.1, 3.0, 2.9, 2.8, 2.7, 2.6]
        .into_iter()
        .map(AlertThreshold)
        .collect()
}

/// One step of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedScenario {
    pub index: usize,
    pub label: String,
    pub kind: ScenarioKind,
    pub threshold: Option<AlertThreshold>,
    pub config: ScenarioConfig,
}

/// Lay out the sequence: base, initial, then one steady step per threshold
/// entry after the first two. Base and initial always run; when the list is
/// shorter than two they are labelled by kind.
pub fn plan_scenarios(table: &ScenarioTable, thresholds: &[AlertThreshold]) -> Vec<PlannedScenario> {
    let steady_steps = thresholds.len().saturating_sub(2);
    let kinds = [ScenarioKind::Base, ScenarioKind::Initial]
        .into_iter()
        .chain(std::iter::repeat(ScenarioKind::Steady).take(steady_steps));

    kinds
        .enumerate()
        .map(|(index, kind)| {
            let threshold = thresholds.get(index).copied();
            PlannedScenario {
                index,
                label: threshold.map_or_else(|| kind.name().to_string(), AlertThreshold::label),
                kind,
                threshold,
                config: *table.for_kind(kind),
            }
        })
        .collect()
}

/// A produced scenario result with its identity and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRecord {
    pub index: usize,
    pub label: String,
    pub kind: ScenarioKind,
    pub threshold: Option<AlertThreshold>,
    pub config: ScenarioConfig,
    pub result: ScenarioResult,
}

/// How a driver run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Complete,
    /// Scenario `index` failed; records before it are valid, nothing after
    /// it ran.
    Aborted {
        index: usize,
        label: String,
        error: SimError,
    },
}

impl RunStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, RunStatus::Complete)
    }
}

/// Everything a run leaves for persistence and plotting.
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub records: Vec<ScenarioRecord>,
    pub population: Population,
    pub status: RunStatus,
}

impl SimulationOutcome {
    pub fn is_complete(&self) -> bool {
        self.status.is_complete()
    }

    pub fn results(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.records.iter().map(|r| &r.result)
    }
}

/// Owns the population and the plan for one run.
#[derive(Debug, Clone)]
pub struct ScenarioDriver {
    plan: Vec<PlannedScenario>,
    population: Population,
    records: Vec<ScenarioRecord>,
    halted: Option<RunStatus>,
}

impl ScenarioDriver {
    pub fn new(population: Population, plan: Vec<PlannedScenario>) -> Self {
        Self {
            records: Vec::with_capacity(plan.len()),
            plan,
            population,
            halted: None,
        }
    }

    pub fn from_table(
        population: Population,
        table: &ScenarioTable,
        thresholds: &[AlertThreshold],
    ) -> Self {
        Self::new(population, plan_scenarios(table, thresholds))
    }

    pub fn plan(&self) -> &[PlannedScenario] {
        &self.plan
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn records(&self) -> &[ScenarioRecord] {
        &self.records
    }

    /// True once every planned scenario ran or a step failed.
    pub fn is_finished(&self) -> bool {
        self.halted.is_some() || self.records.len() == self.plan.len()
    }

    /// Run the next scenario. `Ok(None)` once the sequence is exhausted.
    /// After an error the driver stays halted and further calls return the
    /// same error. A population without categories fails the first step
    /// with [`SimError::EmptyCategorySet`].
    pub fn step<R: RandomSource + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<&ScenarioRecord>, SimError> {
        if let Some(RunStatus::Aborted { error, .. }) = &self.halted {
            return Err(error.clone());
        }
        let Some(planned) = self.plan.get(self.records.len()) else {
            return Ok(None);
        };

        let evaluated = if self.population.categories.is_empty() {
            Err(SimError::EmptyCategorySet)
        } else {
            evaluate_scenario(&mut self.population, &planned.config, rng)
        };
        match evaluated {
            Ok(result) => {
                self.records.push(ScenarioRecord {
                    index: planned.index,
                    label: planned.label.clone(),
                    kind: planned.kind,
                    threshold: planned.threshold,
                    config: planned.config,
                    result,
                });
                Ok(self.records.last())
            }
            Err(error) => {
                self.halted = Some(RunStatus::Aborted {
                    index: planned.index,
                    label: planned.label.clone(),
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    /// Run every remaining scenario.
    pub fn run<R: RandomSource + ?Sized>(self, rng: &mut R) -> SimulationOutcome {
        self.run_with(rng, |_| {})
    }

    /// Run every remaining scenario, handing each record to `observer` as
    /// soon as it is produced.
    pub fn run_with<R, F>(mut self, rng: &mut R, mut observer: F) -> SimulationOutcome
    where
        R: RandomSource + ?Sized,
        F: FnMut(&ScenarioRecord),
    {
        loop {
            match self.step(rng) {
                Ok(Some(record)) => observer(record),
                Ok(None) | Err(_) => break,
            }
        }
        self.into_outcome()
    }

    pub fn into_outcome(self) -> SimulationOutcome {
        SimulationOutcome {
            records: self.records,
            population: self.population,
            status: self.halted.unwrap_or(RunStatus::Complete),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::rng::RngSource;

    #[test]
    fn reference_plan_has_eight_steps() {
        let plan = plan_scenarios(&ScenarioTable::reference(), &reference_thresholds());
        assert_eq!(plan.len(), 8);
        assert_eq!(plan[0].kind, ScenarioKind::Base);
        assert_eq!(plan[0].label, "∞");
        assert_eq!(plan[1].kind, ScenarioKind::Initial);
        assert_eq!(plan[1].label, "3.2");
        assert!(plan[2..].iter().all(|p| p.kind == ScenarioKind::Steady));
        assert_eq!(plan[7].label, "2.6");
        assert_eq!(plan[0].config.detection_ratio, 0.0);
        assert_eq!(plan[1].config.detection_ratio, 0.3);
        assert_eq!(plan[5].config.detection_ratio, 0.2);
        assert!(plan.iter().enumerate().all(|(i, p)| p.index == i));
    }

    #[test]
    fn short_threshold_lists_still_run_base_and_initial() {
        let table = ScenarioTable::reference();
        let plan = plan_scenarios(&table, &[]);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].label, "base case");
        assert_eq!(plan[1].label, "initial deployment");

        let plan = plan_scenarios(&table, &[AlertThreshold::DISABLED]);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].label, "∞");
        assert_eq!(plan[1].threshold, None);
    }

    #[test]
    fn run_produces_one_record_per_step() {
        let pop = Population::new(vec![Category::with_fresh_exemplars("A", 3)]);
        let driver =
            ScenarioDriver::from_table(pop, &ScenarioTable::reference(), &reference_thresholds());
        let mut seen = Vec::new();
        let outcome = driver.run_with(&mut RngSource::seeded(1), |r| seen.push(r.index));

        assert!(outcome.is_complete());
        assert_eq!(outcome.records.len(), 8);
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
        assert_eq!(outcome.population.exemplar_count(), 3);
    }

    #[test]
    fn failing_step_keeps_prior_records() {
        let mut table = ScenarioTable::reference();
        table.steady.detection_ratio = 1.5;
        let pop = Population::new(vec![Category::with_fresh_exemplars("A", 2)]);
        let mut driver = ScenarioDriver::from_table(pop, &table, &reference_thresholds());
        let mut rng = RngSource::seeded(2);

        assert!(driver.step(&mut rng).unwrap().is_some());
        assert!(driver.step(&mut rng).unwrap().is_some());
        assert!(driver.step(&mut rng).is_err());
        assert!(driver.is_finished());
        assert!(driver.step(&mut rng).is_err());

        let outcome = driver.into_outcome();
        assert_eq!(outcome.records.len(), 2);
        match outcome.status {
            RunStatus::Aborted { index, ref label, .. } => {
                assert_eq!(index, 2);
                assert_eq!(label, "3.1");
            }
            RunStatus::Complete => panic!("expected abort"),
        }
    }

    #[test]
    fn exhausted_driver_returns_none() {
        let pop = Population::new(vec![Category::with_fresh_exemplars("A", 1)]);
        let mut driver = ScenarioDriver::from_table(pop, &ScenarioTable::reference(), &[]);
        let mut rng = RngSource::seeded(0);
        assert!(driver.step(&mut rng).unwrap().is_some());
        assert!(driver.step(&mut rng).unwrap().is_some());
        assert!(driver.step(&mut rng).unwrap().is_none());
        assert!(driver.is_finished());
    }

    #[test]
    fn empty_population_is_rejected_on_first_step() {
        let driver = ScenarioDriver::from_table(
            Population::default(),
            &ScenarioTable::reference(),
            &reference_thresholds(),
        );
        let outcome = driver.run(&mut RngSource::seeded(0));
        assert!(outcome.records.is_empty());
        match outcome.status {
            RunStatus::Aborted { index, error, .. } => {
                assert_eq!(index, 0);
                assert_eq!(error, SimError::EmptyCategorySet);
            }
            RunStatus::Complete => panic!("expected abort"),
        }
    }

    #[test]
    fn reference_table_is_valid() {
        assert!(ScenarioTable::reference().validate().is_ok());
    }
}
