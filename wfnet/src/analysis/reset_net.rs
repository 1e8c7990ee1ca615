use std::collections::VecDeque;

use crate::{
    error::{Result, WorkflowError},
    net::{JoinType, NetDefinition, PlaceId, SplitType, TransitionId},
};

use super::{subsets::non_empty_subsets, AnalyzerConfig};

/// Origin of a reset place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetPlaceKind {
    /// A place of the workflow net.
    Condition(PlaceId),
    /// The internal place marking a task between its start and end transition.
    Busy(TransitionId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetTransitionKind {
    Start,
    End,
}

/// Transition of the reset net. Place references are indices into [`ResetNet::places`].
#[derive(Clone, Debug)]
pub struct ResetTransition {
    label: String,
    task: TransitionId,
    kind: ResetTransitionKind,
    pub(super) preset: Vec<usize>,
    pub(super) postset: Vec<usize>,
    pub(super) resets: Vec<usize>,
}

impl ResetTransition {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn task(&self) -> TransitionId {
        self.task
    }

    pub fn kind(&self) -> ResetTransitionKind {
        self.kind
    }

    pub fn preset(&self) -> &[usize] {
        &self.preset
    }

    pub fn postset(&self) -> &[usize] {
        &self.postset
    }

    /// Places emptied when this transition fires.
    pub fn resets(&self) -> &[usize] {
        &self.resets
    }
}

/// Reset-net view of a workflow net used for OR-join analysis.
///
/// Index `i < n` is the condition for [`PlaceId`] `i`, index `n + t` is the busy place of
/// transition `t`. Restriction never renumbers places, it only marks them as dropped.
#[derive(Clone, Debug)]
pub struct ResetNet {
    places: Vec<ResetPlaceKind>,
    labels: Vec<String>,
    alive: Vec<bool>,
    transitions: Vec<ResetTransition>,
}

impl ResetNet {
    /// Translate every task into start and end transitions around a busy place.
    ///
    /// OR-joins get one start transition per preset place, the same shape as XOR-joins. The
    /// OR-join under analysis has its start transitions removed afterwards with
    /// [`ResetNet::remove_start_of`].
    pub fn convert(net: &NetDefinition, config: &AnalyzerConfig) -> Result<ResetNet> {
        let n = net.place_count();
        let mut places = Vec::with_capacity(n + net.transition_count());
        let mut labels = Vec::with_capacity(n + net.transition_count());
        for pl_id in net.place_ids() {
            places.push(ResetPlaceKind::Condition(pl_id));
            labels.push(net.place(pl_id).name().to_string());
        }
        for tr_id in net.transition_ids() {
            places.push(ResetPlaceKind::Busy(tr_id));
            labels.push(format!("p_{}", net.transition(tr_id).name()));
        }

        let mut transitions = Vec::new();
        for tr_id in net.transition_ids() {
            let task = net.transition(tr_id);
            let name = task.name();
            let busy = n + tr_id.0;
            let preset: Vec<usize> = dedup(net.preset(tr_id).iter().map(|p| p.0));
            let postset: Vec<usize> = dedup(net.postset(tr_id).iter().map(|p| p.0));
            let cancel = net.cancellation_set(tr_id);
            let resets: Vec<usize> = dedup(
                cancel.places().iter().map(|p| p.0).chain(cancel.transitions().iter().map(|t| n + t.0)),
            );

            let start = |label: String, preset: Vec<usize>| ResetTransition {
                label,
                task: tr_id,
                kind: ResetTransitionKind::Start,
                preset,
                postset: vec![busy],
                resets: vec![],
            };
            match task.join() {
                JoinType::And => transitions.push(start(format!("{name}_start"), preset)),
                JoinType::Xor | JoinType::Or => {
                    for &p in &preset {
                        transitions.push(start(format!("{name}_start^{}", labels[p]), vec![p]));
                    }
                }
            }

            let end = |label: String, postset: Vec<usize>| ResetTransition {
                label,
                task: tr_id,
                kind: ResetTransitionKind::End,
                preset: vec![busy],
                postset,
                resets: resets.clone(),
            };
            match task.split() {
                SplitType::And => transitions.push(end(format!("{name}_end"), postset)),
                SplitType::Xor => {
                    for &p in &postset {
                        transitions.push(end(format!("{name}_end^{}", labels[p]), vec![p]));
                    }
                }
                SplitType::Or => {
                    if postset.len() > config.max_or_split_branches {
                        return Err(WorkflowError::Complexity(format!(
                            "OR-split '{name}' has {} branches, at most {} are expanded into end transitions",
                            postset.len(),
                            config.max_or_split_branches
                        )));
                    }
                    for subset in non_empty_subsets(postset.len()) {
                        let chosen: Vec<usize> = subset.iter().map(|&idx| postset[idx]).collect();
                        let names: Vec<&str> = chosen.iter().map(|&p| labels[p].as_str()).collect();
                        transitions.push(end(format!("{name}_end^{{{}}}", names.join(" ")), chosen));
                    }
                }
            }
        }

        let alive = vec![true; places.len()];
        Ok(ResetNet { places, labels, alive, transitions })
    }

    /// Drop the start transitions of `task`: assume it never fires.
    pub fn remove_start_of(&mut self, task: TransitionId) {
        self.transitions.retain(|tr| !(tr.task == task && tr.kind == ResetTransitionKind::Start));
    }

    /// Keep only the part of the net that can put tokens on `targets`.
    pub fn restrict_backward(&mut self, targets: &[PlaceId]) {
        let producers = self.index_by_place(|tr| &tr.postset);
        let mut places = vec![false; self.places.len()];
        let mut keep = vec![false; self.transitions.len()];
        let mut queue = VecDeque::new();
        for target in targets {
            if self.alive[target.0] && !places[target.0] {
                places[target.0] = true;
                queue.push_back(target.0);
            }
        }
        while let Some(p) = queue.pop_front() {
            for &tr_idx in &producers[p] {
                if keep[tr_idx] {
                    continue;
                }
                keep[tr_idx] = true;
                for &pre in &self.transitions[tr_idx].preset {
                    if !places[pre] {
                        places[pre] = true;
                        queue.push_back(pre);
                    }
                }
            }
        }
        self.apply_restriction(&places, &keep);
    }

    /// Keep only the part of the net that can receive tokens from the marked places.
    ///
    /// A transition is reachable once every place of its preset is.
    pub fn restrict_forward(&mut self, marked: impl IntoIterator<Item = PlaceId>) {
        let consumers = self.index_by_place(|tr| &tr.preset);
        let mut places = vec![false; self.places.len()];
        let mut keep = vec![false; self.transitions.len()];
        let mut missing: Vec<usize> = self.transitions.iter().map(|tr| tr.preset.len()).collect();
        let mut queue = VecDeque::new();
        for pl_id in marked {
            if pl_id.0 < self.alive.len() && self.alive[pl_id.0] && !places[pl_id.0] {
                places[pl_id.0] = true;
                queue.push_back(pl_id.0);
            }
        }
        while let Some(p) = queue.pop_front() {
            for &tr_idx in &consumers[p] {
                missing[tr_idx] -= 1;
                if missing[tr_idx] > 0 {
                    continue;
                }
                keep[tr_idx] = true;
                for &post in &self.transitions[tr_idx].postset {
                    if !places[post] {
                        places[post] = true;
                        queue.push_back(post);
                    }
                }
            }
        }
        self.apply_restriction(&places, &keep);
    }

    fn index_by_place<F>(&self, arcs: F) -> Vec<Vec<usize>>
    where
        F: Fn(&ResetTransition) -> &Vec<usize>,
    {
        let mut index = vec![Vec::new(); self.places.len()];
        for (tr_idx, tr) in self.transitions.iter().enumerate() {
            for &p in arcs(tr) {
                index[p].push(tr_idx);
            }
        }
        index
    }

    fn apply_restriction(&mut self, places: &[bool], keep: &[bool]) {
        for (alive, &reached) in self.alive.iter_mut().zip(places) {
            *alive = *alive && reached;
        }
        let mut idx = 0;
        self.transitions.retain(|_| {
            idx += 1;
            keep[idx - 1]
        });
        let alive = &self.alive;
        for tr in &mut self.transitions {
            tr.preset.retain(|&p| alive[p]);
            tr.postset.retain(|&p| alive[p]);
            tr.resets.retain(|&p| alive[p]);
        }
    }

    pub fn places(&self) -> &[ResetPlaceKind] {
        &self.places
    }

    pub fn place_label(&self, idx: usize) -> &str {
        &self.labels[idx]
    }

    pub fn is_alive(&self, idx: usize) -> bool {
        self.alive.get(idx).copied().unwrap_or(false)
    }

    pub fn alive_places(&self) -> impl Iterator<Item = usize> + '_ {
        self.alive.iter().enumerate().filter(|(_, &alive)| alive).map(|(idx, _)| idx)
    }

    pub fn transitions(&self) -> &[ResetTransition] {
        &self.transitions
    }

    pub fn transition(&self, label: &str) -> Option<&ResetTransition> {
        self.transitions.iter().find(|tr| tr.label == label)
    }
}

fn dedup(items: impl Iterator<Item = usize>) -> Vec<usize> {
    let mut result = Vec::new();
    for item in items {
        if !result.contains(&item) {
            result.push(item);
        }
    }
    result
}
