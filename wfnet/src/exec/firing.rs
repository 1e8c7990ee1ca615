use tracing::debug;

use crate::{
    analysis::AnalyzerConfig,
    error::{assert_state, Result, WorkflowError},
    marking::{FiringRecord, Marking, MarkingChange},
    net::{NetDefinition, PlaceId, SplitType, TransitionId},
};

use super::{Enablement, EnablementEvaluator};

/// Postset places that receive a token when a transition fires.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputSelection {
    places: Vec<PlaceId>,
}

impl OutputSelection {
    pub fn new(places: impl IntoIterator<Item = PlaceId>) -> Self {
        let mut result = Vec::new();
        for pl_id in places {
            if !result.contains(&pl_id) {
                result.push(pl_id);
            }
        }
        OutputSelection { places: result }
    }

    pub fn single(place_id: PlaceId) -> Self {
        OutputSelection { places: vec![place_id] }
    }

    /// The whole postset of `transition_id`.
    pub fn all(net: &NetDefinition, transition_id: TransitionId) -> Self {
        OutputSelection::new(net.postset(transition_id).iter().copied())
    }

    pub fn by_names(net: &NetDefinition, names: &[&str]) -> Result<Self> {
        let places = names
            .iter()
            .map(|name| {
                net.place_id(name)
                    .ok_or_else(|| WorkflowError::ValueError(format!("Unknown place '{name}'")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(OutputSelection::new(places))
    }

    pub fn places(&self) -> &[PlaceId] {
        &self.places
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Check the selection against the postset and split type of `transition_id`.
    pub fn validate(&self, net: &NetDefinition, transition_id: TransitionId) -> Result<()> {
        let transition = net.transition(transition_id);
        let postset = net.postset(transition_id);
        assert_state!(
            !self.places.is_empty(),
            format!("Empty output selection for transition '{}'", transition.name())
        )?;
        if let Some(pl_id) = self.places.iter().find(|pl_id| !postset.contains(pl_id)) {
            return Err(WorkflowError::IllegalState(format!(
                "Place '{}' is not in the postset of transition '{}'",
                pl_id.0,
                transition.name()
            )));
        }
        match transition.split() {
            SplitType::And => assert_state!(
                self.places.len() == postset.len(),
                format!(
                    "AND-split '{}' must produce on all {} postset places, got {}",
                    transition.name(),
                    postset.len(),
                    self.places.len()
                )
            ),
            SplitType::Xor => assert_state!(
                self.places.len() == 1,
                format!(
                    "XOR-split '{}' must produce on exactly one place, got {}",
                    transition.name(),
                    self.places.len()
                )
            ),
            SplitType::Or => Ok(()),
        }
    }
}

/// Applies firings to a live marking.
pub struct FiringEngine<'a> {
    evaluator: EnablementEvaluator<'a>,
}

impl<'a> FiringEngine<'a> {
    pub fn new(net: &'a NetDefinition, config: &'a AnalyzerConfig) -> Self {
        FiringEngine { evaluator: EnablementEvaluator::new(net, config) }
    }

    pub fn evaluator(&self) -> &EnablementEvaluator<'a> {
        &self.evaluator
    }

    /// Fire `transition_id` on `marking`.
    ///
    /// Consumes the tokens that satisfied the join, produces one token on each selected place and
    /// then empties the cancellation set. Either everything is applied or `marking` is left
    /// untouched.
    pub fn fire(
        &self,
        marking: &mut Marking,
        transition_id: TransitionId,
        selection: &OutputSelection,
    ) -> Result<FiringRecord> {
        let net = self.evaluator.net();
        if !net.contains_transition(transition_id) {
            return Err(WorkflowError::ValueError(format!(
                "Transition '{}' does not exist",
                transition_id.0
            )));
        }
        let transition = net.transition(transition_id);
        selection.validate(net, transition_id)?;
        let take = match self.evaluator.evaluate(transition_id, &*marking)? {
            Enablement::Enabled(data) => data.take,
            Enablement::Disabled(_) => {
                return Err(WorkflowError::IllegalState(format!(
                    "Transition '{}' is not enabled",
                    transition.name()
                )))
            }
        };

        let mut next = marking.clone();
        let mut record = FiringRecord::new(transition_id);
        for &pl_id in &take {
            next.remove_tokens(pl_id, 1)?;
            record.changes.push(MarkingChange::Consume(pl_id, transition_id));
        }
        for &pl_id in selection.places() {
            next.add_tokens(pl_id, 1)?;
            record.changes.push(MarkingChange::Produce(pl_id, transition_id));
        }
        for &pl_id in net.cancellation_set(transition_id).places() {
            let removed = next.clear_place(pl_id)?;
            if removed > 0 {
                record.changes.push(MarkingChange::Cancel(pl_id, transition_id, removed));
            }
        }
        *marking = next;

        debug!(transition = transition.name(), %record, "Fired transition.");
        Ok(record)
    }
}
