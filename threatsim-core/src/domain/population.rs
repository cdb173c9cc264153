use serde::{Deserialize, Serialize};

use super::exemplar::Exemplar;

/// A named group of exemplars. Its size is fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub exemplars: Vec<Exemplar>,
}

impl Category {
    pub fn with_fresh_exemplars(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            exemplars: vec![Exemplar::fresh(); count],
        }
    }

    pub fn len(&self) -> usize {
        self.exemplars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exemplars.is_empty()
    }
}

/// The category → exemplar-list mapping shared by every scenario of a run.
///
/// Categories keep the order they were configured in; that order drives
/// report columns and series order downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub categories: Vec<Category>,
}

impl Population {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// Total exemplars across all categories (the plot's y-axis bound).
    pub fn exemplar_count(&self) -> usize {
        self.categories.iter().map(Category::len).sum()
    }

    pub fn exemplars(&self) -> impl Iterator<Item = &Exemplar> {
        self.categories.iter().flat_map(|c| c.exemplars.iter())
    }

    pub fn exemplars_mut(&mut self) -> impl Iterator<Item = &mut Exemplar> {
        self.categories.iter_mut().flat_map(|c| c.exemplars.iter_mut())
    }
}
