mod analyzer;
mod config;
mod coverability;
mod reset_net;
pub(crate) mod subsets;

pub use analyzer::{OrJoinVerdict, ResetNetAnalyzer};
pub use config::{AnalyzerConfig, AnalyzerConfigBuilder, AnalyzerConfigBuilderError};
pub use reset_net::{ResetNet, ResetPlaceKind, ResetTransition, ResetTransitionKind};
