use std::sync::Arc;

use tokio::{select, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Result, WorkflowError};

use super::{CaseId, CaseOutcome, Engine, Router};

/// Drive `cases` of `engine` to quiescence in parallel.
///
/// Every case runs on tokio's blocking pool while holding its own lock. Cancelling
/// `cancel_token` cancels all cases that are still active at their next step. Outcomes are
/// returned in case id order; the first failing case aborts the remaining ones.
#[tracing::instrument(level = "info", skip_all, fields(cases = cases.len()))]
pub async fn run(
    engine: Arc<Engine>,
    cases: Vec<CaseId>,
    router: Arc<dyn Router>,
    cancel_token: CancellationToken,
) -> Result<Vec<CaseOutcome>> {
    // nothing is spawned before every case is locked
    let mut guards = Vec::with_capacity(cases.len());
    for case_id in cases {
        guards.push(engine.lock_case(case_id).await?);
    }

    let cases_token = cancel_token.child_token();
    let mut tasks = JoinSet::<Result<CaseOutcome>>::new();
    for mut guard in guards {
        let router = Arc::clone(&router);
        let token = cases_token.clone();
        tasks.spawn_blocking(move || {
            guard.run_until_cancelled(router.as_ref(), || token.is_cancelled())
        });
    }

    let mut outcomes = Vec::new();
    let mut cancelled = false;
    loop {
        select! {
            res = tasks.join_next() => {
                let Some(res) = res else {
                    break;
                };
                let outcome = res.map_err(|err| {
                    WorkflowError::IllegalState(format!("Case task finished unexpectedly: {err}"))
                });
                match outcome.and_then(|outcome| outcome) {
                    Ok(outcome) => {
                        debug!(case = %outcome.case, state = ?outcome.state, "Case finished.");
                        outcomes.push(outcome);
                    }
                    Err(err) => {
                        warn!(%err, "Case failed, stopping remaining cases.");
                        cases_token.cancel();
                        while tasks.join_next().await.is_some() {}
                        return Err(err);
                    }
                }
            },
            _ = cancel_token.cancelled(), if !cancelled => {
                warn!("Run cancelled, waiting for cases to stop.");
                cancelled = true;
            }
        }
    }

    outcomes.sort_by_key(|outcome| outcome.case);
    Ok(outcomes)
}
