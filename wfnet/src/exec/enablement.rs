use std::collections::BTreeSet;

use tracing::trace;

use crate::{
    analysis::{AnalyzerConfig, ResetNetAnalyzer},
    error::{Result, WorkflowError},
    marking::{Marking, MarkingSnapshot},
    net::{JoinType, NetDefinition, PlaceId, TransitionId},
};

/// Read access to token counts, implemented by the live marking and by snapshots.
pub trait MarkingView {
    fn token_count(&self, place_id: PlaceId) -> u32;

    fn marked_places(&self) -> Vec<PlaceId>;

    fn to_snapshot(&self) -> MarkingSnapshot;
}

impl MarkingView for Marking {
    fn token_count(&self, place_id: PlaceId) -> u32 {
        Marking::token_count(self, place_id)
    }

    fn marked_places(&self) -> Vec<PlaceId> {
        Marking::marked_places(self).collect()
    }

    fn to_snapshot(&self) -> MarkingSnapshot {
        self.snapshot()
    }
}

impl MarkingView for MarkingSnapshot {
    fn token_count(&self, place_id: PlaceId) -> u32 {
        MarkingSnapshot::token_count(self, place_id)
    }

    fn marked_places(&self) -> Vec<PlaceId> {
        MarkingSnapshot::marked_places(self).collect()
    }

    fn to_snapshot(&self) -> MarkingSnapshot {
        self.clone()
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct EnabledData {
    /// Preset places a firing takes one token from.
    pub take: Vec<PlaceId>,
}

#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct DisabledData {
    /// A preset place the transition is waiting for, if a single one can be named.
    pub wait_for: Option<PlaceId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Enablement {
    Enabled(EnabledData),
    Disabled(DisabledData),
}

impl Enablement {
    pub fn is_enabled(&self) -> bool {
        matches!(self, Enablement::Enabled(_))
    }

    pub fn take(&self) -> Option<&[PlaceId]> {
        match self {
            Enablement::Enabled(data) => Some(&data.take),
            Enablement::Disabled(_) => None,
        }
    }

    fn enabled(take: Vec<PlaceId>) -> Self {
        Enablement::Enabled(EnabledData { take })
    }

    fn disabled(wait_for: Option<PlaceId>) -> Self {
        Enablement::Disabled(DisabledData { wait_for })
    }
}

/// Join semantics: decides whether a transition may fire in a given marking.
pub struct EnablementEvaluator<'a> {
    net: &'a NetDefinition,
    config: &'a AnalyzerConfig,
}

impl<'a> EnablementEvaluator<'a> {
    pub fn new(net: &'a NetDefinition, config: &'a AnalyzerConfig) -> Self {
        EnablementEvaluator { net, config }
    }

    pub fn net(&self) -> &'a NetDefinition {
        self.net
    }

    pub fn is_enabled(&self, transition_id: TransitionId, marking: &impl MarkingView) -> Result<bool> {
        Ok(self.evaluate(transition_id, marking)?.is_enabled())
    }

    /// Evaluate the join of `transition_id`.
    ///
    /// AND and XOR joins only look at the preset. OR-joins with a partially marked preset are
    /// handed to the [`ResetNetAnalyzer`].
    pub fn evaluate(
        &self,
        transition_id: TransitionId,
        marking: &impl MarkingView,
    ) -> Result<Enablement> {
        if !self.net.contains_transition(transition_id) {
            return Err(WorkflowError::ValueError(format!(
                "Transition '{}' does not exist",
                transition_id.0
            )));
        }
        let transition = self.net.transition(transition_id);
        let preset = self.net.preset(transition_id);
        let result = match transition.join() {
            JoinType::And => match preset.iter().find(|&&p| marking.token_count(p) == 0) {
                Some(&empty) => Enablement::disabled(Some(empty)),
                None => Enablement::enabled(preset.to_vec()),
            },
            JoinType::Xor => match preset.iter().find(|&&p| marking.token_count(p) > 0) {
                Some(&marked) => Enablement::enabled(vec![marked]),
                None => Enablement::disabled(None),
            },
            JoinType::Or => {
                let marked: Vec<PlaceId> =
                    preset.iter().copied().filter(|&p| marking.token_count(p) > 0).collect();
                if marked.is_empty() {
                    Enablement::disabled(None)
                } else if marked.len() == preset.len() {
                    Enablement::enabled(marked)
                } else {
                    let analyzer = ResetNetAnalyzer::new(self.net, self.config);
                    let verdict = analyzer.or_join_enabled(transition_id, &marking.to_snapshot())?;
                    if verdict.enabled {
                        Enablement::enabled(marked)
                    } else {
                        Enablement::disabled(verdict.live_branch)
                    }
                }
            }
        };
        trace!(
            transition = transition.name(),
            join = %transition.join(),
            enabled = result.is_enabled(),
            "Evaluated enablement."
        );
        Ok(result)
    }

    /// All enabled transitions in id order.
    ///
    /// Only transitions with at least one marked preset place are evaluated.
    pub fn enabled_transitions(&self, marking: &impl MarkingView) -> Result<Vec<TransitionId>> {
        let mut enabled = Vec::new();
        for tr_id in self.candidates(marking) {
            if self.is_enabled(tr_id, marking)? {
                enabled.push(tr_id);
            }
        }
        Ok(enabled)
    }

    /// First enabled transition in id order together with its enablement data.
    pub fn first_enabled(
        &self,
        marking: &impl MarkingView,
    ) -> Result<Option<(TransitionId, EnabledData)>> {
        for tr_id in self.candidates(marking) {
            if let Enablement::Enabled(data) = self.evaluate(tr_id, marking)? {
                return Ok(Some((tr_id, data)));
            }
        }
        Ok(None)
    }

    /// Transitions with at least one marked preset place, in id order.
    pub fn candidates(&self, marking: &impl MarkingView) -> BTreeSet<TransitionId> {
        marking
            .marked_places()
            .into_iter()
            .filter(|&p| self.net.contains_place(p))
            .flat_map(|p| self.net.consumers(p).iter().copied())
            .collect()
    }
}
