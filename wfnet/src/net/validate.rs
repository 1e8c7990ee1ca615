use std::collections::VecDeque;

use crate::error::{Result, WorkflowError};

use super::{NetDefinition, Place, PlaceId, PlaceKind, TransitionId};

/// Find the unique source and sink place.
pub(super) fn source_and_sink(places: &[Place]) -> Result<(PlaceId, PlaceId)> {
    let of_kind = |kind: PlaceKind| -> Vec<PlaceId> {
        places
            .iter()
            .enumerate()
            .filter(|(_, pl)| pl.kind() == kind)
            .map(|(idx, _)| PlaceId(idx))
            .collect()
    };
    let sources = of_kind(PlaceKind::Source);
    let sinks = of_kind(PlaceKind::Sink);
    let names = |ids: &[PlaceId]| -> String {
        ids.iter().map(|id| places[id.0].name()).collect::<Vec<_>>().join(", ")
    };
    match (sources.as_slice(), sinks.as_slice()) {
        ([source], [sink]) => Ok((*source, *sink)),
        ([], _) => Err(WorkflowError::Structure("Net has no source place.".into())),
        (_, []) => Err(WorkflowError::Structure("Net has no sink place.".into())),
        ([_], _) => Err(WorkflowError::Structure(format!(
            "Net has more than one sink place: [{}]",
            names(&sinks)
        ))),
        _ => Err(WorkflowError::Structure(format!(
            "Net has more than one source place: [{}]",
            names(&sources)
        ))),
    }
}

/// Check local arc constraints and global connectedness of a workflow net.
pub(super) fn well_formed(net: &NetDefinition) -> Result<()> {
    for tr_id in net.transition_ids() {
        let name = net.transition(tr_id).name();
        if net.preset(tr_id).is_empty() {
            return Err(WorkflowError::Structure(format!("Transition '{name}' has no input place.")));
        }
        if net.postset(tr_id).is_empty() {
            return Err(WorkflowError::Structure(format!(
                "Transition '{name}' has no output place."
            )));
        }
    }

    for pl_id in net.place_ids() {
        let place = net.place(pl_id);
        let name = place.name();
        let has_in = !net.producers(pl_id).is_empty();
        let has_out = !net.consumers(pl_id).is_empty();
        match place.kind() {
            PlaceKind::Source if has_in => {
                return Err(WorkflowError::Structure(format!(
                    "Source place '{name}' has incoming arcs."
                )));
            }
            PlaceKind::Sink if has_out => {
                return Err(WorkflowError::Structure(format!(
                    "Sink place '{name}' has outgoing arcs."
                )));
            }
            PlaceKind::Internal if !has_in => {
                return Err(WorkflowError::Structure(format!(
                    "Place '{name}' has no incoming arcs but is not the source place."
                )));
            }
            PlaceKind::Internal if !has_out => {
                return Err(WorkflowError::Structure(format!(
                    "Place '{name}' has no outgoing arcs but is not the sink place."
                )));
            }
            _ => {}
        }
    }

    let (places, transitions) = reachable(net, net.source(), Direction::Forward);
    unreached(net, &places, &transitions, "reachable from the source place")?;
    let (places, transitions) = reachable(net, net.sink(), Direction::Backward);
    unreached(net, &places, &transitions, "able to reach the sink place")?;
    Ok(())
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// Breadth first search over the bipartite graph, returns visited flags.
fn reachable(net: &NetDefinition, start: PlaceId, dir: Direction) -> (Vec<bool>, Vec<bool>) {
    let mut places = vec![false; net.place_count()];
    let mut transitions = vec![false; net.transition_count()];
    let mut queue = VecDeque::from([start]);
    places[start.0] = true;
    while let Some(pl_id) = queue.pop_front() {
        let next_transitions = match dir {
            Direction::Forward => net.consumers(pl_id),
            Direction::Backward => net.producers(pl_id),
        };
        for &tr_id in next_transitions {
            if transitions[tr_id.0] {
                continue;
            }
            transitions[tr_id.0] = true;
            let next_places = match dir {
                Direction::Forward => net.postset(tr_id),
                Direction::Backward => net.preset(tr_id),
            };
            for &next in next_places {
                if !places[next.0] {
                    places[next.0] = true;
                    queue.push_back(next);
                }
            }
        }
    }
    (places, transitions)
}

fn unreached(net: &NetDefinition, places: &[bool], transitions: &[bool], what: &str) -> Result<()> {
    let mut missing: Vec<&str> = places
        .iter()
        .enumerate()
        .filter(|(_, &seen)| !seen)
        .map(|(idx, _)| net.place(PlaceId(idx)).name())
        .chain(
            transitions
                .iter()
                .enumerate()
                .filter(|(_, &seen)| !seen)
                .map(|(idx, _)| net.transition(TransitionId(idx)).name()),
        )
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    missing.sort_unstable();
    Err(WorkflowError::Structure(format!("Nodes not {what}: [{}]", missing.join(", "))))
}

#[cfg(test)]
mod tests {
    use crate::error::WorkflowError;
    use crate::net::{JoinType, NetDefinitionBuilder, Place, SplitType, Transition};

    fn message(net: &NetDefinitionBuilder) -> String {
        match net.build() {
            Err(WorkflowError::Structure(msg)) => msg,
            Err(err) => panic!("unexpected error {err}"),
            Ok(_) => panic!("net should have been rejected"),
        }
    }

    fn base() -> NetDefinitionBuilder {
        let mut net = NetDefinitionBuilder::default();
        net.insert_place(Place::source("i"));
        net.insert_place(Place::internal("c"));
        net.insert_place(Place::sink("o"));
        net.insert_transition(Transition::new("a", JoinType::Xor, SplitType::And));
        net.insert_transition(Transition::new("b", JoinType::Xor, SplitType::And));
        net.flow_in("i", "a").unwrap();
        net.flow_out("a", "c").unwrap();
        net.flow_in("c", "b").unwrap();
        net.flow_out("b", "o").unwrap();
        net
    }

    #[test]
    fn accepts_sequence() {
        assert!(base().build().is_ok());
    }

    #[test]
    fn requires_unique_source_and_sink() {
        let mut net = base();
        net.insert_place(Place::source("i2"));
        assert!(message(&net).contains("more than one source"));

        let mut net = base();
        net.insert_place(Place::sink("o2"));
        assert!(message(&net).contains("more than one sink"));

        let mut net = base();
        net.insert_place(Place::internal("o"));
        assert!(message(&net).contains("no sink"));
    }

    #[test]
    fn undeclared_source_is_rejected() {
        let mut net = base();
        net.insert_place(Place::internal("start"));
        net.insert_transition(Transition::new("x", JoinType::Xor, SplitType::And));
        net.flow_in("start", "x").unwrap();
        net.flow_out("x", "c").unwrap();
        assert!(message(&net).contains("'start' has no incoming arcs"));
    }

    #[test]
    fn source_and_sink_direction() {
        let mut net = base();
        net.insert_transition(Transition::new("back", JoinType::Xor, SplitType::And));
        net.flow_in("c", "back").unwrap();
        net.flow_out("back", "i").unwrap();
        assert!(message(&net).contains("Source place 'i' has incoming arcs"));

        let mut net = base();
        net.insert_transition(Transition::new("after", JoinType::Xor, SplitType::And));
        net.flow_in("o", "after").unwrap();
        net.flow_out("after", "c").unwrap();
        assert!(message(&net).contains("Sink place 'o' has outgoing arcs"));
    }

    #[test]
    fn transitions_need_both_sides() {
        let mut net = base();
        net.insert_transition(Transition::new("dangling", JoinType::Xor, SplitType::And));
        net.flow_in("c", "dangling").unwrap();
        assert!(message(&net).contains("'dangling' has no output place"));
    }

    #[test]
    fn detects_disconnected_cycle() {
        let mut net = base();
        net.insert_place(Place::internal("l1"));
        net.insert_place(Place::internal("l2"));
        net.insert_transition(Transition::new("t1", JoinType::Xor, SplitType::And));
        net.insert_transition(Transition::new("t2", JoinType::Xor, SplitType::And));
        net.flow_in("l1", "t1").unwrap();
        net.flow_out("t1", "l2").unwrap();
        net.flow_in("l2", "t2").unwrap();
        net.flow_out("t2", "l1").unwrap();
        assert_eq!(message(&net), "Nodes not reachable from the source place: [l1, l2, t1, t2]");
    }

    #[test]
    fn detects_livelock_trap() {
        // c2 is reachable, but there is no way back to the sink
        let mut net = base();
        net.insert_place(Place::internal("c2"));
        net.insert_transition(Transition::new("trap", JoinType::Xor, SplitType::And));
        net.insert_transition(Transition::new("spin", JoinType::Xor, SplitType::And));
        net.flow_in("c", "trap").unwrap();
        net.flow_out("trap", "c2").unwrap();
        net.flow_in("c2", "spin").unwrap();
        net.flow_out("spin", "c2").unwrap();
        assert_eq!(message(&net), "Nodes not able to reach the sink place: [c2, spin, trap]");
    }
}
