use derive_builder::Builder;

const DEFAULT_MAX_OR_SPLIT_BRANCHES: usize = 12;
const DEFAULT_MAX_BASIS_SIZE: usize = 50_000;
const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Bounds for the OR-join analysis.
///
/// Exceeding any of them aborts the analysis with a
/// [`WorkflowError::Complexity`](crate::error::WorkflowError::Complexity) instead of guessing.
#[derive(Builder, Clone, Debug, PartialEq, Eq)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct AnalyzerConfig {
    /// Largest OR-split postset that is expanded into one end transition per non-empty subset.
    #[builder(default = "DEFAULT_MAX_OR_SPLIT_BRANCHES")]
    pub max_or_split_branches: usize,
    /// Largest number of minimal markings kept in the predecessor basis.
    #[builder(default = "DEFAULT_MAX_BASIS_SIZE")]
    pub max_basis_size: usize,
    /// Largest number of backward steps for a single coverability query.
    #[builder(default = "DEFAULT_MAX_ITERATIONS")]
    pub max_iterations: usize,
}

impl AnalyzerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(branches) = self.max_or_split_branches {
            // one end transition per non-empty subset, counted in an usize
            if branches == 0 || branches >= usize::BITS as usize {
                return Err(format!("max_or_split_branches must be in 1..{}", usize::BITS));
            }
        }
        if self.max_basis_size == Some(0) {
            return Err("max_basis_size must be positive".into());
        }
        if self.max_iterations == Some(0) {
            return Err("max_iterations must be positive".into());
        }
        Ok(())
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            max_or_split_branches: DEFAULT_MAX_OR_SPLIT_BRANCHES,
            max_basis_size: DEFAULT_MAX_BASIS_SIZE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_default() {
        assert_eq!(AnalyzerConfigBuilder::default().build().unwrap(), AnalyzerConfig::default());
    }

    #[test]
    fn rejects_zero_bounds() {
        assert!(AnalyzerConfigBuilder::default().max_basis_size(0).build().is_err());
        assert!(AnalyzerConfigBuilder::default().max_iterations(0).build().is_err());
        assert!(AnalyzerConfigBuilder::default().max_or_split_branches(0).build().is_err());
        assert!(AnalyzerConfigBuilder::default().max_or_split_branches(64).build().is_err());
        let config = AnalyzerConfigBuilder::default().max_or_split_branches(3).build().unwrap();
        assert_eq!(config.max_or_split_branches, 3);
    }
}
