mod enablement;
mod firing;

pub use enablement::{DisabledData, EnabledData, Enablement, EnablementEvaluator, MarkingView};
pub use firing::{FiringEngine, OutputSelection};
