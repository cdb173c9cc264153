//! State updater: one exemplar's next `(r, d, t)` from its prior values.
//!
//! The three rules read disjoint prior fields (`r` → `r'`, `t` → `t'`,
//! `d` → `d'`), so updating in place in the order r, t, d is the same as
//! updating from a snapshot. Draw order per exemplar is fixed: one unit draw
//! for `r`, one for `t`, then one chance draw for `d` only while detected.

use crate::domain::{Exemplar, ScenarioConfig, DETECTED, UNDETECTED};
use crate::error::SimError;
use crate::rng::RandomSource;

/// `r' = max(0, U(0, max_failure) + (r − max_failure))`. No upper clamp.
pub fn next_resilience<R: RandomSource + ?Sized>(prior: f64, max_failure: f64, rng: &mut R) -> f64 {
    let drift = rng.next_unit() * max_failure;
    (drift + (prior - max_failure)).max(0.0)
}

/// `t' = max(0, U(0, max_time_slew) + t)`.
pub fn next_timing<R: RandomSource + ?Sized>(prior: f64, max_time_slew: f64, rng: &mut R) -> f64 {
    let slew = rng.next_unit() * max_time_slew;
    (slew + prior).max(0.0)
}

/// Sticky detection ratchet: once `0`, always `0`. Otherwise stays `1` with
/// probability `detection_ratio`.
pub fn next_detection<R: RandomSource + ?Sized>(prior: u8, detection_ratio: f64, rng: &mut R) -> u8 {
    if prior == UNDETECTED {
        return UNDETECTED;
    }
    if rng.next_chance(detection_ratio) {
        DETECTED
    } else {
        UNDETECTED
    }
}

/// Apply all three rules to one exemplar in place. Parameters are assumed
/// validated; see [`update_exemplar`].
pub fn step_exemplar<R: RandomSource + ?Sized>(
    exemplar: &mut Exemplar,
    config: &ScenarioConfig,
    rng: &mut R,
) {
    exemplar.r = next_resilience(exemplar.r, config.max_failure, rng);
    exemplar.t = next_timing(exemplar.t, config.max_time_slew, rng);
    exemplar.d = next_detection(exemplar.d, config.detection_ratio, rng);
}

/// Validate `config`, then update one exemplar in place.
pub fn update_exemplar<R: RandomSource + ?Sized>(
    exemplar: &mut Exemplar,
    config: &ScenarioConfig,
    rng: &mut R,
) -> Result<(), SimError> {
    config.validate()?;
    step_exemplar(exemplar, config, rng);
    Ok(())
}
