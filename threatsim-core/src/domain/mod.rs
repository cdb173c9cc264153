//! Domain types: exemplars, categories, scenario parameters and results.

pub mod exemplar;
pub mod population;
pub mod scenario;
pub mod threshold;

pub use exemplar::{Exemplar, DETECTED, UNDETECTED};
pub use population::{Category, Population};
pub use scenario::{time_key, ScenarioConfig, ScenarioKind, ScenarioResult, TIME_SUFFIX};
pub use threshold::AlertThreshold;
