//! Error types for population generation and scenario evaluation.
//!
//! Every variant is a deterministic input-validation failure. Nothing here is
//! transient, so callers never retry: they fix the input.

use thiserror::Error;

/// Errors raised by the core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    /// A category range has `min > max`.
    #[error("invalid population bounds for '{category}': min {min} > max {max}")]
    InvalidPopulationBounds {
        category: String,
        min: usize,
        max: usize,
    },

    /// A scenario parameter is negative, non-finite, or (for the detection
    /// ratio) outside `[0, 1]`.
    #[error("invalid scenario parameter {name} = {value}: {reason}")]
    InvalidScenarioParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// No categories were configured.
    #[error("no categories configured")]
    EmptyCategorySet,

    /// The same category name was configured twice.
    #[error("category '{0}' configured more than once")]
    DuplicateCategory(String),
}

impl SimError {
    pub(crate) fn parameter(name: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidScenarioParameter {
            name,
            value,
            reason,
        }
    }
}
