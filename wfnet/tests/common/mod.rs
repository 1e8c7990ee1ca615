#![allow(dead_code)]

use std::sync::Arc;

use rand::{rngs::StdRng, Rng};
use wfnet::{
    error::Result,
    net::{JoinType, NetDefinition, NetDefinitionBuilder, Place, SplitType, Transition},
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("warn,wfnet=debug"))
        .with_test_writer()
        .try_init();
}

/// Small helper to write nets as `(transition, join, split, inputs, outputs)` rows, inputs and
/// outputs separated by spaces.
pub fn build(
    places: &[&str],
    source: &str,
    sink: &str,
    transitions: &[(&str, JoinType, SplitType, &str, &str)],
) -> Result<NetDefinition> {
    let mut net = NetDefinitionBuilder::default();
    for &name in places {
        let place = if name == source {
            Place::source(name)
        } else if name == sink {
            Place::sink(name)
        } else {
            Place::internal(name)
        };
        net.insert_place(place);
    }
    for &(name, join, split, inputs, outputs) in transitions {
        net.insert_transition(Transition::new(name, join, split));
        for input in inputs.split_whitespace() {
            net.flow_in(input, name)?;
        }
        for output in outputs.split_whitespace() {
            net.flow_out(name, output)?;
        }
    }
    net.build()
}

/// i -> a (OR-split) -> {x, y}; x -> b -> x2; y -> c -> y2; {x2, y2} -> j (OR-join) -> o
pub fn or_diamond() -> Arc<NetDefinition> {
    use JoinType as J;
    use SplitType as S;
    let net = build(
        &["i", "x", "y", "x2", "y2", "o"],
        "i",
        "o",
        &[
            ("a", J::Xor, S::Or, "i", "x y"),
            ("b", J::Xor, S::And, "x", "x2"),
            ("c", J::Xor, S::And, "y", "y2"),
            ("j", J::Or, S::And, "x2 y2", "o"),
        ],
    );
    Arc::new(net.unwrap())
}

fn join_type(rng: &mut StdRng) -> JoinType {
    match rng.random_range(0..3) {
        0 => JoinType::And,
        1 => JoinType::Xor,
        _ => JoinType::Or,
    }
}

fn split_type(rng: &mut StdRng) -> SplitType {
    match rng.random_range(0..3) {
        0 => SplitType::And,
        1 => SplitType::Xor,
        _ => SplitType::Or,
    }
}

/// Random acyclic workflow net.
///
/// Every transition consumes one or two places nobody else consumes and produces one to three
/// fresh places. A final transition collects everything left over into the sink.
pub fn random_net(rng: &mut StdRng, transitions: usize) -> NetDefinition {
    random_net_with(rng, transitions, 0.0)
}

/// Like [`random_net`], but each transition cancels up to two earlier places with probability
/// `cancel_chance`.
pub fn random_cancelling_net(rng: &mut StdRng, transitions: usize, cancel_chance: f64) -> NetDefinition {
    random_net_with(rng, transitions, cancel_chance)
}

fn random_net_with(rng: &mut StdRng, transitions: usize, cancel_chance: f64) -> NetDefinition {
    let mut net = NetDefinitionBuilder::default();
    net.insert_place(Place::source("i"));
    let mut pending = vec!["i".to_string()];
    let mut created = vec!["i".to_string()];
    for t in 0..transitions {
        let name = format!("t{t}");
        net.insert_transition(Transition::new(&name, join_type(rng), split_type(rng)));
        let inputs = rng.random_range(1..=pending.len().min(2));
        for _ in 0..inputs {
            let idx = rng.random_range(0..pending.len());
            let place = pending.swap_remove(idx);
            net.flow_in(&place, &name).unwrap();
        }
        if cancel_chance > 0.0 && rng.random_bool(cancel_chance) {
            for _ in 0..rng.random_range(1..=2) {
                let place = &created[rng.random_range(0..created.len())];
                net.insert_cancellation(&name, place).unwrap();
            }
        }
        for _ in 0..rng.random_range(1..=3) {
            let place = format!("p{}", created.len() - 1);
            net.insert_place(Place::internal(&place));
            net.flow_out(&name, &place).unwrap();
            pending.push(place.clone());
            created.push(place);
        }
    }
    net.insert_place(Place::sink("o"));
    net.insert_transition(Transition::new("end", join_type(rng), SplitType::And));
    for place in &pending {
        net.flow_in(place, "end").unwrap();
    }
    net.flow_out("end", "o").unwrap();
    net.build().unwrap()
}
