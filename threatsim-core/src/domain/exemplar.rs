use serde::{Deserialize, Serialize};

/// Detection flag value for an exemplar still counted by the scoring formula.
pub const DETECTED: u8 = 1;

/// Detection flag value for an exemplar that has dropped out. Sticky.
pub const UNDETECTED: u8 = 0;

/// One simulated occurrence of an attack-category risk factor.
///
/// - `r`: resilience/failure rate. Never negative; no upper clamp.
/// - `d`: detection flag in `{0, 1}`, used as a multiplicative weight.
///   Non-increasing across scenarios.
/// - `t`: accumulated timing skew. Never negative, non-decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    pub r: f64,
    pub d: u8,
    pub t: f64,
}

impl Exemplar {
    /// A fresh exemplar: `{r: 1, d: 1, t: 1}`.
    pub fn fresh() -> Self {
        Self {
            r: 1.0,
            d: DETECTED,
            t: 1.0,
        }
    }

    pub fn is_detected(&self) -> bool {
        self.d != UNDETECTED
    }

    /// Detection flag as a scoring weight.
    pub fn weight(&self) -> f64 {
        f64::from(self.d)
    }
}

impl Default for Exemplar {
    fn default() -> Self {
        Self::fresh()
    }
}
