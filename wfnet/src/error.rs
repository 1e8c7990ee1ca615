use crate::{analysis::AnalyzerConfigBuilderError, runner::RunnerConfigBuilderError};

#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error("Malformed net: {0}")]
    Structure(String),
    #[error("Illegal state: {0}")]
    IllegalState(String),
    #[error("Analysis bound exceeded: {0}")]
    Complexity(String),
    #[error("Inappropriate value: {0}")]
    ValueError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Analyzer configuration error: {0}")]
    AnalyzerConfigError(#[from] AnalyzerConfigBuilderError),
    #[error("Runner configuration error: {0}")]
    RunnerConfigError(#[from] RunnerConfigBuilderError),
    #[error("Case did not reach quiescence within {0} steps")]
    StepLimitExceeded(u64),
    #[error("Action Cancelled")]
    Cancelled(),
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Turn a failed check into an [`WorkflowError::IllegalState`] carrying the call site.
macro_rules! assert_state {
    ($value:expr, $msg:expr) => {
        if ($value) {
            Ok(())
        } else {
            Err($crate::error::WorkflowError::IllegalState(format!(
                "{} ({}:{})",
                $msg,
                file!(),
                line!()
            )))
        }
    };
}

pub(crate) use assert_state;
