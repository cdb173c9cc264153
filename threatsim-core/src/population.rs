//! Population generator: builds the initial category → exemplar-list mapping.
//!
//! Two mutually exclusive selection modes:
//! - paper-matched: each category gets its reference-table count verbatim;
//! - randomized: each category's count is drawn uniformly from `[min, max]`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::{Category, Population};
use crate::error::SimError;
use crate::rng::RandomSource;

/// A configured category and its reference-table ("paper") exemplar count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub name: String,
    pub paper_count: usize,
}

impl CategorySpec {
    pub fn new(name: impl Into<String>, paper_count: usize) -> Self {
        Self {
            name: name.into(),
            paper_count,
        }
    }
}

/// How each category's exemplar count is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionMode {
    /// Use the reference-table counts verbatim.
    PaperMatched,
    /// Draw each count independently and uniformly from `[min, max]`.
    Randomized { min: usize, max: usize },
}

impl SelectionMode {
    /// Expected exemplar count for one category under this mode.
    pub fn expected_count(&self, spec: &CategorySpec) -> f64 {
        match *self {
            SelectionMode::PaperMatched => spec.paper_count as f64,
            SelectionMode::Randomized { min, max } => (min + max) as f64 / 2.0,
        }
    }
}

/// The reference category table.
pub fn paper_categories() -> Vec<CategorySpec> {
    [
        ("Loss_of_View", 8),
        ("Loss_of_Control", 4),
        ("Denial_of_View", 1),
        ("Denial_of_Control", 5),
        ("Denial_of_Safety", 3),
        ("Manipulation_of_View", 3),
        ("Manipulation_of_Control", 5),
        ("Manipulation_of_Sensors", 3),
        ("Manipulation_of_Safety", 10),
    ]
    .into_iter()
    .map(|(name, count)| CategorySpec::new(name, count))
    .collect()
}

/// Check the category set and the selection mode without drawing anything.
pub fn validate_population(specs: &[CategorySpec], mode: &SelectionMode) -> Result<(), SimError> {
    if specs.is_empty() {
        return Err(SimError::EmptyCategorySet);
    }
    let mut seen = HashSet::with_capacity(specs.len());
    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(SimError::DuplicateCategory(spec.name.clone()));
        }
    }
    if let SelectionMode::Randomized { min, max } = *mode {
        if min > max {
            return Err(SimError::InvalidPopulationBounds {
                category: specs[0].name.clone(),
                min,
                max,
            });
        }
    }
    Ok(())
}

/// Build a fresh population, every exemplar initialized to `{r: 1, d: 1, t: 1}`.
///
/// Validation happens before any draw, so an invalid input consumes no
/// randomness. Paper-matched mode consumes none at all.
pub fn generate_population<R: RandomSource + ?Sized>(
    specs: &[CategorySpec],
    mode: &SelectionMode,
    rng: &mut R,
) -> Result<Population, SimError> {
    validate_population(specs, mode)?;

    let categories = specs
        .iter()
        .map(|spec| {
            let count = match *mode {
                SelectionMode::PaperMatched => spec.paper_count,
                SelectionMode::Randomized { min, max } => rng.next_count(min, max),
            };
            Category::with_fresh_exemplars(spec.name.clone(), count)
        })
        .collect();

    Ok(Population::new(categories))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Exemplar;
    use crate::rng::{RngSource, ScriptedSource};

    #[test]
    fn paper_mode_uses_table_counts() {
        let specs = vec![CategorySpec::new("A", 2), CategorySpec::new("B", 3)];
        let mut rng = ScriptedSource::constant(0.5);
        let pop = generate_population(&specs, &SelectionMode::PaperMatched, &mut rng).unwrap();

        assert_eq!(pop.get("A").unwrap().len(), 2);
        assert_eq!(pop.get("B").unwrap().len(), 3);
        assert!(pop.exemplars().all(|e| *e == Exemplar::fresh()));
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn randomized_mode_stays_in_range() {
        let specs = paper_categories();
        let mode = SelectionMode::Randomized { min: 1, max: 10 };
        let mut rng = RngSource::seeded(1234);
        for _ in 0..50 {
            let pop = generate_population(&specs, &mode, &mut rng).unwrap();
            assert_eq!(pop.category_count(), specs.len());
            for c in &pop.categories {
                assert!((1..=10).contains(&c.len()), "{} has {}", c.name, c.len());
            }
        }
    }

    #[test]
    fn randomized_mode_with_equal_bounds_is_fixed() {
        let specs = vec![CategorySpec::new("A", 99)];
        let mode = SelectionMode::Randomized { min: 4, max: 4 };
        let pop = generate_population(&specs, &mode, &mut RngSource::seeded(0)).unwrap();
        assert_eq!(pop.exemplar_count(), 4);
    }

    #[test]
    fn zero_counts_are_allowed() {
        let specs = vec![CategorySpec::new("A", 0)];
        let pop =
            generate_population(&specs, &SelectionMode::PaperMatched, &mut RngSource::seeded(0))
                .unwrap();
        assert!(pop.get("A").unwrap().is_empty());
    }

    #[test]
    fn inverted_bounds_fail_fast() {
        let specs = paper_categories();
        let mode = SelectionMode::Randomized { min: 5, max: 2 };
        let mut rng = ScriptedSource::constant(0.5);
        let err = generate_population(&specs, &mode, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            SimError::InvalidPopulationBounds { min: 5, max: 2, .. }
        ));
        assert_eq!(rng.consumed(), 0);
    }

    #[test]
    fn empty_and_duplicate_category_sets_rejected() {
        let mut rng = ScriptedSource::constant(0.5);
        assert_eq!(
            generate_population(&[], &SelectionMode::PaperMatched, &mut rng),
            Err(SimError::EmptyCategorySet)
        );

        let specs = vec![CategorySpec::new("A", 1), CategorySpec::new("A", 2)];
        assert_eq!(
            generate_population(&specs, &SelectionMode::PaperMatched, &mut rng),
            Err(SimError::DuplicateCategory("A".into()))
        );
    }

    #[test]
    fn paper_table_matches_reference() {
        let specs = paper_categories();
        assert_eq!(specs.len(), 9);
        assert_eq!(specs.iter().map(|s| s.paper_count).sum::<usize>(), 42);
        assert_eq!(specs[0], CategorySpec::new("Loss_of_View", 8));
        assert_eq!(specs[8], CategorySpec::new("Manipulation_of_Safety", 10));
    }

    #[test]
    fn expected_count_per_mode() {
        let spec = CategorySpec::new("A", 8);
        assert_eq!(SelectionMode::PaperMatched.expected_count(&spec), 8.0);
        assert_eq!(
            SelectionMode::Randomized { min: 1, max: 10 }.expected_count(&spec),
            5.5
        );
    }
}
