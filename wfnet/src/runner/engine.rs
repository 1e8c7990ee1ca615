use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

use crate::{
    error::{Result, WorkflowError},
    exec::{Enablement, OutputSelection},
    marking::{FiringRecord, SerializableMarking},
    net::{NetDefinition, TransitionId},
};

use super::{CaseId, CaseOutcome, CaseRunner, CaseState, Router, RunnerConfig};

type CaseMap = HashMap<CaseId, Arc<Mutex<CaseRunner>>>;

/// Registry of running cases.
///
/// Each case sits behind its own mutex, so different cases can be evaluated and fired in
/// parallel while a single case only ever has one writer.
pub struct Engine {
    config: RunnerConfig,
    next_id: AtomicU64,
    cases: RwLock<CaseMap>,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(RunnerConfig::default())
    }
}

impl Engine {
    pub fn new(config: RunnerConfig) -> Self {
        Engine { config, next_id: AtomicU64::new(1), cases: Default::default() }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Start a new case of `net` with one token on its source place.
    pub async fn launch_case(&self, net: Arc<NetDefinition>) -> CaseId {
        let case_id = CaseId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let runner = CaseRunner::new(net, case_id, self.config.clone());
        self.cases.write().await.insert(case_id, Arc::new(Mutex::new(runner)));
        info!(case = %case_id, "Launched case.");
        case_id
    }

    pub async fn case_ids(&self) -> Vec<CaseId> {
        let mut ids: Vec<CaseId> = self.cases.read().await.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Forget a case. Its runner is dropped once no task holds it any more.
    pub async fn remove_case(&self, case_id: CaseId) -> Result<()> {
        match self.cases.write().await.remove(&case_id) {
            Some(_) => {
                debug!(case = %case_id, "Removed case.");
                Ok(())
            }
            None => Err(not_found(case_id)),
        }
    }

    async fn case(&self, case_id: CaseId) -> Result<Arc<Mutex<CaseRunner>>> {
        self.cases.read().await.get(&case_id).cloned().ok_or_else(|| not_found(case_id))
    }

    /// Exclusive access to a case that outlives the borrow of the engine.
    pub async fn lock_case(&self, case_id: CaseId) -> Result<OwnedMutexGuard<CaseRunner>> {
        Ok(self.case(case_id).await?.lock_owned().await)
    }

    pub async fn state(&self, case_id: CaseId) -> Result<CaseState> {
        Ok(self.case(case_id).await?.lock().await.state())
    }

    pub async fn outcome(&self, case_id: CaseId) -> Result<CaseOutcome> {
        self.case(case_id).await?.lock().await.outcome()
    }

    pub async fn enabled_transitions(&self, case_id: CaseId) -> Result<BTreeSet<TransitionId>> {
        let case = self.case(case_id).await?;
        let guard = case.lock().await;
        Ok(guard.enabled_transitions()?.into_iter().collect())
    }

    pub async fn evaluate(&self, case_id: CaseId, transition_id: TransitionId) -> Result<Enablement> {
        self.case(case_id).await?.lock().await.evaluate(transition_id)
    }

    pub async fn fire(
        &self,
        case_id: CaseId,
        transition_id: TransitionId,
        selection: &OutputSelection,
    ) -> Result<FiringRecord> {
        self.case(case_id).await?.lock().await.fire(transition_id, selection)
    }

    /// Persisted form of the case's marking.
    pub async fn snapshot(&self, case_id: CaseId) -> Result<SerializableMarking> {
        Ok(self.case(case_id).await?.lock().await.to_serializable())
    }

    pub async fn restore(&self, case_id: CaseId, data: &SerializableMarking) -> Result<()> {
        self.case(case_id).await?.lock().await.restore(data)
    }

    pub async fn cancel(&self, case_id: CaseId) -> Result<()> {
        self.case(case_id).await?.lock().await.cancel();
        Ok(())
    }

    /// Drive one case to quiescence on the blocking pool.
    pub async fn run_case(&self, case_id: CaseId, router: Arc<dyn Router>) -> Result<CaseOutcome> {
        let mut guard = self.lock_case(case_id).await?;
        tokio::task::spawn_blocking(move || guard.run_to_quiescence(router.as_ref()))
            .await
            .map_err(|err| WorkflowError::IllegalState(format!("Case task failed: {err}")))?
    }
}

fn not_found(case_id: CaseId) -> WorkflowError {
    WorkflowError::NotFound(format!("No case with id '{case_id}'"))
}
