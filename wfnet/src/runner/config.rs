use derive_builder::Builder;

use crate::analysis::AnalyzerConfig;

const DEFAULT_MAX_STEPS: u64 = 10_000;

/// Settings of a [`CaseRunner`](super::CaseRunner).
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RunnerConfig {
    /// Firings allowed in a single `run_to_quiescence` call.
    #[builder(default = "DEFAULT_MAX_STEPS")]
    pub max_steps: u64,
    #[builder(default)]
    pub analyzer: AnalyzerConfig,
}

impl RunnerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.max_steps == Some(0) {
            return Err("max_steps must be positive".into());
        }
        Ok(())
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig { max_steps: DEFAULT_MAX_STEPS, analyzer: AnalyzerConfig::default() }
    }
}
