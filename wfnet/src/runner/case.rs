use std::{fmt::Display, sync::Arc};

use tracing::{debug, info, warn};

use crate::{
    analysis::subsets::non_empty_subsets,
    error::{assert_state, Result, WorkflowError},
    exec::{Enablement, FiringEngine, OutputSelection},
    marking::{FiringRecord, Marking, MarkingChange, MarkingSnapshot, SerializableMarking},
    net::{NetDefinition, PlaceId, SplitType, TransitionId},
};

use super::{RunnerConfig, Router};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseId(pub u64);

impl Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "case-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaseState {
    Active,
    Completed,
    Cancelled,
    Deadlocked,
}

impl CaseState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CaseState::Active)
    }
}

/// Result of driving a case, including what is left over.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseOutcome {
    pub case: CaseId,
    pub state: CaseState,
    /// Firings applied to the case so far.
    pub steps: u64,
    pub marking: MarkingSnapshot,
    /// Marked places other than the sink.
    pub stranded: Vec<PlaceId>,
    /// Transitions with a marked preset place that are not enabled.
    pub blocked: Vec<TransitionId>,
}

/// One case of a workflow net: its marking, state and firing history.
///
/// All methods take `&mut self` or `&self`; the single writer is whoever owns the runner.
pub struct CaseRunner {
    id: CaseId,
    net: Arc<NetDefinition>,
    config: RunnerConfig,
    marking: Marking,
    state: CaseState,
    steps: u64,
    changes: Vec<MarkingChange>,
}

impl CaseRunner {
    /// A fresh case holding one token on the source place.
    pub fn new(net: Arc<NetDefinition>, id: CaseId, config: RunnerConfig) -> Self {
        let marking = Marking::initial(&net);
        CaseRunner {
            id,
            net,
            config,
            marking,
            state: CaseState::Active,
            steps: 0,
            changes: Vec::new(),
        }
    }

    pub fn id(&self) -> CaseId {
        self.id
    }

    pub fn net(&self) -> &Arc<NetDefinition> {
        &self.net
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn state(&self) -> CaseState {
        self.state
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn marking(&self) -> &Marking {
        &self.marking
    }

    pub fn snapshot(&self) -> MarkingSnapshot {
        self.marking.snapshot()
    }

    /// Every change applied to the marking so far, case level resets and restores included.
    pub fn changes(&self) -> &[MarkingChange] {
        &self.changes
    }

    fn engine(&self) -> FiringEngine<'_> {
        FiringEngine::new(&self.net, &self.config.analyzer)
    }

    pub fn evaluate(&self, transition_id: TransitionId) -> Result<Enablement> {
        self.engine().evaluator().evaluate(transition_id, &self.marking)
    }

    pub fn enabled_transitions(&self) -> Result<Vec<TransitionId>> {
        self.engine().evaluator().enabled_transitions(&self.marking)
    }

    /// Fire a single transition with an explicit output selection.
    pub fn fire(
        &mut self,
        transition_id: TransitionId,
        selection: &OutputSelection,
    ) -> Result<FiringRecord> {
        let record = self.fire_unsettled(transition_id, selection)?;
        self.settle()?;
        Ok(record)
    }

    pub fn fire_by_name(&mut self, transition: &str, places: &[&str]) -> Result<FiringRecord> {
        let transition_id = self.net.transition_id(transition).ok_or_else(|| {
            WorkflowError::ValueError(format!("Unknown transition '{transition}'"))
        })?;
        let selection = OutputSelection::by_names(&self.net, places)?;
        self.fire(transition_id, &selection)
    }

    fn fire_unsettled(
        &mut self,
        transition_id: TransitionId,
        selection: &OutputSelection,
    ) -> Result<FiringRecord> {
        assert_state!(
            self.state == CaseState::Active,
            format!("{} is {:?}, no more firings possible", self.id, self.state)
        )?;
        let mut marking = self.marking.clone();
        let record = self.engine().fire(&mut marking, transition_id, selection)?;
        self.marking = marking;
        self.steps += 1;
        self.changes.extend(record.changes.iter().cloned());
        Ok(record)
    }

    /// Fire the first enabled transition in transition order, routed by `router`.
    ///
    /// Returns `None` if nothing is enabled. Like [`CaseRunner::fire`], the case moves into its
    /// terminal state as soon as nothing is enabled any more.
    pub fn step(&mut self, router: &dyn Router) -> Result<Option<FiringRecord>> {
        if self.state.is_terminal() {
            return Ok(None);
        }
        let next = self.engine().evaluator().first_enabled(&self.marking)?;
        match next {
            None => {
                self.settle()?;
                Ok(None)
            }
            Some((tr_id, _)) => {
                let selection = router.route(&self.net, tr_id, &self.marking.snapshot())?;
                let record = self.fire_unsettled(tr_id, &selection)?;
                self.settle()?;
                Ok(Some(record))
            }
        }
    }

    /// Step until nothing is enabled any more.
    ///
    /// Fails with [`WorkflowError::StepLimitExceeded`] after `max_steps` firings; the case stays
    /// active and can be driven further.
    pub fn run_to_quiescence(&mut self, router: &dyn Router) -> Result<CaseOutcome> {
        self.run_until_cancelled(router, || false)
    }

    /// Like [`CaseRunner::run_to_quiescence`], but checks `is_cancelled` before every step and
    /// cancels the case once it returns `true`.
    #[tracing::instrument(level = "debug", skip_all, fields(case = %self.id))]
    pub fn run_until_cancelled(
        &mut self,
        router: &dyn Router,
        is_cancelled: impl Fn() -> bool,
    ) -> Result<CaseOutcome> {
        let mut fired = 0u64;
        loop {
            if !self.state.is_terminal() && is_cancelled() {
                self.cancel();
                break;
            }
            if self.step(router)?.is_none() {
                break;
            }
            fired += 1;
            if fired < self.config.max_steps {
                continue;
            }
            if self.engine().evaluator().first_enabled(&self.marking)?.is_some() {
                warn!(case = %self.id, steps = self.steps, "Step limit reached.");
                return Err(WorkflowError::StepLimitExceeded(self.config.max_steps));
            }
        }
        self.outcome()
    }

    /// Determine completion or deadlock if nothing is enabled.
    fn settle(&mut self) -> Result<()> {
        if self.state != CaseState::Active || !self.enabled_transitions()?.is_empty() {
            return Ok(());
        }
        let sink = self.net.sink();
        if self.marking.is_marked(sink) {
            self.state = CaseState::Completed;
            let stranded = self.stranded_places();
            if stranded.is_empty() {
                info!(case = %self.id, steps = self.steps, "Case completed.");
            } else {
                warn!(
                    case = %self.id,
                    steps = self.steps,
                    stranded = ?self.place_names(&stranded),
                    "Case completed with stranded tokens."
                );
            }
        } else {
            self.state = CaseState::Deadlocked;
            let stranded = self.stranded_places();
            warn!(
                case = %self.id,
                steps = self.steps,
                stranded = ?self.place_names(&stranded),
                "Case deadlocked."
            );
        }
        Ok(())
    }

    fn stranded_places(&self) -> Vec<PlaceId> {
        let sink = self.net.sink();
        self.marking.marked_places().filter(|&pl_id| pl_id != sink).collect()
    }

    fn place_names(&self, places: &[PlaceId]) -> Vec<String> {
        places.iter().map(|&pl_id| self.net.place(pl_id).name().to_string()).collect()
    }

    /// Current state together with deadlock diagnostics.
    pub fn outcome(&self) -> Result<CaseOutcome> {
        let engine = self.engine();
        let evaluator = engine.evaluator();
        let mut blocked = Vec::new();
        for tr_id in evaluator.candidates(&self.marking) {
            if !evaluator.is_enabled(tr_id, &self.marking)? {
                blocked.push(tr_id);
            }
        }
        Ok(CaseOutcome {
            case: self.id,
            state: self.state,
            steps: self.steps,
            marking: self.marking.snapshot(),
            stranded: self.stranded_places(),
            blocked,
        })
    }

    /// Remove every token and stop the case.
    pub fn cancel(&mut self) {
        if self.state == CaseState::Cancelled {
            return;
        }
        let removed = self.marking.total_tokens();
        self.marking.clear();
        self.state = CaseState::Cancelled;
        self.changes.push(MarkingChange::Reset());
        info!(case = %self.id, removed, "Case cancelled.");
    }

    pub fn to_serializable(&self) -> SerializableMarking {
        self.marking.to_serializable(&self.net)
    }

    /// Replace the marking with a persisted one and re-derive the state from it.
    pub fn restore(&mut self, data: &SerializableMarking) -> Result<()> {
        self.marking = Marking::from_serializable(&self.net, data)?;
        self.state = CaseState::Active;
        self.changes.push(MarkingChange::Restore());
        debug!(case = %self.id, tokens = self.marking.total_tokens(), "Restored marking.");
        self.settle()
    }

    /// Every marking reachable by one firing, with the transition and selection producing it.
    pub fn successors(&self) -> Result<Vec<(TransitionId, OutputSelection, MarkingSnapshot)>> {
        let engine = self.engine();
        let mut result = Vec::new();
        for tr_id in engine.evaluator().enabled_transitions(&self.marking)? {
            for selection in self.admissible_selections(tr_id)? {
                let mut marking = self.marking.clone();
                engine.fire(&mut marking, tr_id, &selection)?;
                result.push((tr_id, selection, marking.snapshot()));
            }
        }
        Ok(result)
    }

    fn admissible_selections(&self, transition_id: TransitionId) -> Result<Vec<OutputSelection>> {
        let postset = self.net.postset(transition_id);
        Ok(match self.net.transition(transition_id).split() {
            SplitType::And => vec![OutputSelection::all(&self.net, transition_id)],
            SplitType::Xor => postset.iter().map(|&pl_id| OutputSelection::single(pl_id)).collect(),
            SplitType::Or => {
                let bound = self.config.analyzer.max_or_split_branches;
                if postset.len() > bound {
                    return Err(WorkflowError::Complexity(format!(
                        "OR-split '{}' has {} output places, at most {} are enumerated",
                        self.net.transition(transition_id).name(),
                        postset.len(),
                        bound
                    )));
                }
                non_empty_subsets(postset.len())
                    .map(|subset| OutputSelection::new(subset.into_iter().map(|idx| postset[idx])))
                    .collect()
            }
        })
    }
}
