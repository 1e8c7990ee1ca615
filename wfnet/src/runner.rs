mod case;
mod config;
mod engine;
mod main;
mod routing;

pub use case::{CaseId, CaseOutcome, CaseRunner, CaseState};
pub use config::{RunnerConfig, RunnerConfigBuilder, RunnerConfigBuilderError};
pub use engine::Engine;
pub use main::run;
pub use routing::{DefaultRouter, FixedRouter, Router, RouterRegistry};
