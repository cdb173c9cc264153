//! Score series: the plain data a plotting collaborator needs.
//!
//! One point per scenario (x = threshold label), plus the exemplar count used
//! as the y-axis bound of the total plot and the rounded-up peak category
//! score used as the bound of the per-category plot.

use serde::{Deserialize, Serialize};

use crate::domain::Population;
use crate::driver::ScenarioRecord;

/// One category's plain score per scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySeries {
    pub name: String,
    pub scores: Vec<f64>,
}

impl CategorySeries {
    /// Name with underscores replaced by spaces, as shown in a legend.
    pub fn display_name(&self) -> String {
        self.name.replace('_', " ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSeries {
    pub labels: Vec<String>,
    pub totals: Vec<f64>,
    pub time_totals: Vec<f64>,
    pub categories: Vec<CategorySeries>,
    pub exemplar_count: usize,
    pub category_ceiling: f64,
}

impl ScoreSeries {
    /// Build the series from a run's records. Categories follow the
    /// population's order.
    pub fn from_records(records: &[ScenarioRecord], population: &Population) -> Self {
        let categories: Vec<CategorySeries> = population
            .categories
            .iter()
            .map(|c| CategorySeries {
                name: c.name.clone(),
                scores: records
                    .iter()
                    .map(|r| r.result.score(&c.name).unwrap_or(0.0))
                    .collect(),
            })
            .collect();

        let peak = categories
            .iter()
            .flat_map(|c| c.scores.iter().copied())
            .fold(0.0_f64, f64::max);

        Self {
            labels: records.iter().map(|r| r.label.clone()).collect(),
            totals: records.iter().map(|r| r.result.total).collect(),
            time_totals: records.iter().map(|r| r.result.total_time).collect(),
            categories,
            exemplar_count: population.exemplar_count(),
            category_ceiling: peak.ceil(),
        }
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn peak_total(&self) -> Option<f64> {
        peak(&self.totals)
    }

    pub fn peak_time_total(&self) -> Option<f64> {
        peak(&self.time_totals)
    }

    /// `total[from] − total[to]`, the score drop between two scenarios.
    pub fn delta(&self, from: usize, to: usize) -> Option<f64> {
        Some(self.totals.get(from)? - self.totals.get(to)?)
    }
}

fn peak(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}
