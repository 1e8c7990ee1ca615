use tracing::debug;

use crate::{
    error::{Result, WorkflowError},
    marking::MarkingSnapshot,
    net::{JoinType, NetDefinition, PlaceId, TransitionId},
};

use super::{coverability::Coverability, AnalyzerConfig, ResetNet};

/// Outcome of an OR-join analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrJoinVerdict {
    pub enabled: bool,
    /// An empty preset place that can still receive a token, if any.
    pub live_branch: Option<PlaceId>,
}

/// Decides OR-join enablement by coverability analysis on a reset net.
///
/// Every call starts from scratch on the given snapshot, nothing is cached between calls.
pub struct ResetNetAnalyzer<'a> {
    net: &'a NetDefinition,
    config: &'a AnalyzerConfig,
}

impl<'a> ResetNetAnalyzer<'a> {
    pub fn new(net: &'a NetDefinition, config: &'a AnalyzerConfig) -> Self {
        ResetNetAnalyzer { net, config }
    }

    /// The reset net the decision for `or_join` is based on: converted, without the start
    /// transitions of `or_join`, restricted backward to its preset and forward to the marked
    /// places of `snapshot`.
    pub fn reset_net(&self, or_join: TransitionId, snapshot: &MarkingSnapshot) -> Result<ResetNet> {
        self.check_or_join(or_join)?;
        let mut reset = ResetNet::convert(self.net, self.config)?;
        reset.remove_start_of(or_join);
        reset.restrict_backward(self.net.preset(or_join));
        reset.restrict_forward(snapshot.marked_places());

        let transition = self.net.transition(or_join).name();
        let places = reset.alive_places().count();
        let transitions = reset.transitions().len();
        debug!(transition, places, transitions, "Restricted reset net for OR-join analysis.");
        Ok(reset)
    }

    /// Full analysis, without any shortcut for fully or completely unmarked presets.
    ///
    /// The OR-join is enabled if at least one preset place is marked and no empty preset place
    /// can still be marked without firing the OR-join itself.
    #[tracing::instrument(level = "trace", skip_all, fields(transition = or_join.0))]
    pub fn or_join_enabled(
        &self,
        or_join: TransitionId,
        snapshot: &MarkingSnapshot,
    ) -> Result<OrJoinVerdict> {
        let reset = self.reset_net(or_join, snapshot)?;
        let (marked, empty): (Vec<PlaceId>, Vec<PlaceId>) = self
            .net
            .preset(or_join)
            .iter()
            .copied()
            .partition(|&pl_id| snapshot.is_marked(pl_id));
        if marked.is_empty() {
            return Ok(OrJoinVerdict { enabled: false, live_branch: None });
        }

        let check = Coverability::new(&reset, snapshot.counts(), self.config);
        for &pl_id in &empty {
            let target: Vec<usize> =
                marked.iter().chain(std::iter::once(&pl_id)).map(|p| p.0).collect();
            if check.is_coverable(&target)? {
                debug!(
                    transition = self.net.transition(or_join).name(),
                    place = self.net.place(pl_id).name(),
                    "OR-join waits for live branch."
                );
                return Ok(OrJoinVerdict { enabled: false, live_branch: Some(pl_id) });
            }
        }
        Ok(OrJoinVerdict { enabled: true, live_branch: None })
    }

    fn check_or_join(&self, or_join: TransitionId) -> Result<()> {
        if !self.net.contains_transition(or_join) {
            return Err(WorkflowError::ValueError(format!(
                "Transition '{}' does not exist",
                or_join.0
            )));
        }
        let transition = self.net.transition(or_join);
        if transition.join() != JoinType::Or {
            return Err(WorkflowError::ValueError(format!(
                "Transition '{}' is not an OR-join",
                transition.name()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        marking::Marking,
        net::{NetDefinitionBuilder, Place, SplitType, Transition},
    };

    /// i -> a (OR-split) -> {c1, c2}; c2 -> b -> c3; {c1, c3} -> j (OR-join) -> o
    fn net() -> NetDefinition {
        let mut net = NetDefinitionBuilder::default();
        net.insert_place(Place::source("i"));
        for place in ["c1", "c2", "c3"] {
            net.insert_place(Place::internal(place));
        }
        net.insert_place(Place::sink("o"));
        net.insert_transition(Transition::new("a", JoinType::Xor, SplitType::Or));
        net.insert_transition(Transition::new("b", JoinType::Xor, SplitType::And));
        net.insert_transition(Transition::new("j", JoinType::Or, SplitType::And));
        net.flow_in("i", "a").unwrap();
        net.flow_out("a", "c1").unwrap();
        net.flow_out("a", "c2").unwrap();
        net.flow_in("c2", "b").unwrap();
        net.flow_out("b", "c3").unwrap();
        net.flow_in("c1", "j").unwrap();
        net.flow_in("c3", "j").unwrap();
        net.flow_out("j", "o").unwrap();
        net.build().unwrap()
    }

    fn marking(net: &NetDefinition, places: &[&str]) -> MarkingSnapshot {
        let mut marking = Marking::new(net);
        for name in places {
            marking.add_tokens(net.place_id(name).unwrap(), 1).unwrap();
        }
        marking.snapshot()
    }

    #[test]
    fn restricted_reset_net() {
        let net = net();
        let config = AnalyzerConfig::default();
        let analyzer = ResetNetAnalyzer::new(&net, &config);
        let j = net.transition_id("j").unwrap();
        let reset = analyzer.reset_net(j, &marking(&net, &["c1", "c2"])).unwrap();
        let labels: Vec<&str> = reset.transitions().iter().map(|tr| tr.label()).collect();
        assert_eq!(labels, vec!["b_start^c2", "b_end"]);
        assert!(reset.transition("j_start^c1").is_none());
        assert!(!reset.is_alive(net.place_id("i").unwrap().0));

        let full = analyzer.reset_net(j, &marking(&net, &["i"])).unwrap();
        assert!(full.transition("a_end^{c1 c2}").is_some());
        assert!(full.transition("a_start^i").is_some());
    }

    #[test]
    fn verdicts() {
        let net = net();
        let config = AnalyzerConfig::default();
        let analyzer = ResetNetAnalyzer::new(&net, &config);
        let j = net.transition_id("j").unwrap();
        let c3 = net.place_id("c3").unwrap();

        let verdict = analyzer.or_join_enabled(j, &marking(&net, &["c1", "c2"])).unwrap();
        assert_eq!(verdict, OrJoinVerdict { enabled: false, live_branch: Some(c3) });
        let verdict = analyzer.or_join_enabled(j, &marking(&net, &["c1"])).unwrap();
        assert_eq!(verdict, OrJoinVerdict { enabled: true, live_branch: None });
        let verdict = analyzer.or_join_enabled(j, &marking(&net, &[])).unwrap();
        assert!(!verdict.enabled);

        let a = net.transition_id("a").unwrap();
        assert!(matches!(
            analyzer.or_join_enabled(a, &marking(&net, &["i"])),
            Err(WorkflowError::ValueError(_))
        ));
    }

    #[test]
    fn complexity_bound() {
        let net = net();
        let config = crate::analysis::AnalyzerConfigBuilder::default()
            .max_or_split_branches(1)
            .build()
            .unwrap();
        let analyzer = ResetNetAnalyzer::new(&net, &config);
        let j = net.transition_id("j").unwrap();
        let err = analyzer.or_join_enabled(j, &marking(&net, &["c1"])).unwrap_err();
        assert!(matches!(err, WorkflowError::Complexity(_)));
    }

    /// i -> a (AND-split) -> {c1, x0}; x0 -> s0 -> x1 .. s3 -> x4; {c1, x4} -> j (OR-join) -> o
    fn chain_net() -> NetDefinition {
        let mut net = NetDefinitionBuilder::default();
        net.insert_place(Place::source("i"));
        net.insert_place(Place::internal("c1"));
        for k in 0..=4 {
            net.insert_place(Place::internal(&format!("x{k}")));
        }
        net.insert_place(Place::sink("o"));
        net.insert_transition(Transition::new("a", JoinType::Xor, SplitType::And));
        net.flow_in("i", "a").unwrap();
        net.flow_out("a", "c1").unwrap();
        net.flow_out("a", "x0").unwrap();
        for k in 0..4 {
            let name = format!("s{k}");
            net.insert_transition(Transition::new(&name, JoinType::Xor, SplitType::And));
            net.flow_in(&format!("x{k}"), &name).unwrap();
            net.flow_out(&name, &format!("x{}", k + 1)).unwrap();
        }
        net.insert_transition(Transition::new("j", JoinType::Or, SplitType::And));
        net.flow_in("c1", "j").unwrap();
        net.flow_in("x4", "j").unwrap();
        net.flow_out("j", "o").unwrap();
        net.build().unwrap()
    }

    #[test]
    fn search_bounds() {
        let net = chain_net();
        let j = net.transition_id("j").unwrap();
        let start = marking(&net, &["c1", "x0"]);

        let config = AnalyzerConfig::default();
        let verdict = ResetNetAnalyzer::new(&net, &config).or_join_enabled(j, &start).unwrap();
        assert_eq!(verdict.live_branch, net.place_id("x4"));

        // eight backward steps are needed to reach x0
        let config = crate::analysis::AnalyzerConfigBuilder::default()
            .max_iterations(1)
            .build()
            .unwrap();
        let err = ResetNetAnalyzer::new(&net, &config).or_join_enabled(j, &start).unwrap_err();
        assert!(matches!(err, WorkflowError::Complexity(_)));

        let config = crate::analysis::AnalyzerConfigBuilder::default()
            .max_basis_size(1)
            .build()
            .unwrap();
        let err = ResetNetAnalyzer::new(&net, &config).or_join_enabled(j, &start).unwrap_err();
        assert!(matches!(err, WorkflowError::Complexity(_)));
    }
}
