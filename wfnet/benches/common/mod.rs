use wfnet::net::{JoinType, NetDefinition, NetDefinitionBuilder, Place, SplitType, Transition};

/// OR-split into `width` chains of `depth` tasks each, merged again by an OR-join.
///
///   i ─► split ─► b{n}-0 ─► t{n}-0 ─► ... ─► b{n}-{depth} ─► join ─► o
pub fn or_fan(width: usize, depth: usize) -> NetDefinition {
    let mut net = NetDefinitionBuilder::default();
    net.insert_place(Place::source("i"));
    net.insert_place(Place::sink("o"));
    net.insert_transition(Transition::new("split", JoinType::Xor, SplitType::Or));
    net.insert_transition(Transition::new("join", JoinType::Or, SplitType::And));
    net.flow_in("i", "split").unwrap();
    net.flow_out("join", "o").unwrap();
    for n in 0..width {
        net.insert_place(Place::internal(format!("b{n}-0")));
        net.flow_out("split", &format!("b{n}-0")).unwrap();
        for d in 0..depth {
            let tr = format!("t{n}-{d}");
            let next = format!("b{n}-{}", d + 1);
            net.insert_place(Place::internal(&next));
            net.insert_transition(Transition::new(&tr, JoinType::Xor, SplitType::And));
            net.flow_in(&format!("b{n}-{d}"), &tr).unwrap();
            net.flow_out(&tr, &next).unwrap();
        }
        net.flow_in(&format!("b{n}-{depth}"), "join").unwrap();
    }
    net.build().unwrap()
}
