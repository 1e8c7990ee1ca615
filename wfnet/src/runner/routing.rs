use std::collections::HashMap;

use crate::{
    error::Result,
    exec::OutputSelection,
    marking::MarkingSnapshot,
    net::{NetDefinition, SplitType, TransitionId},
};

/// Chooses the postset places a firing produces on.
///
/// Used when a case is driven automatically. Manual firings pass an [`OutputSelection`] directly.
pub trait Router: Send + Sync {
    fn route(
        &self,
        net: &NetDefinition,
        transition_id: TransitionId,
        marking: &MarkingSnapshot,
    ) -> Result<OutputSelection>;
}

/// Whole postset for AND- and OR-splits, the first postset place for XOR-splits.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultRouter;

impl Router for DefaultRouter {
    fn route(
        &self,
        net: &NetDefinition,
        transition_id: TransitionId,
        _marking: &MarkingSnapshot,
    ) -> Result<OutputSelection> {
        let postset = net.postset(transition_id);
        Ok(match net.transition(transition_id).split() {
            SplitType::And | SplitType::Or => OutputSelection::all(net, transition_id),
            SplitType::Xor => OutputSelection::new(postset.first().copied()),
        })
    }
}

/// Routes by a fixed list of place names, e.g. to pin one branch of an OR-split.
#[derive(Clone, Debug)]
pub struct FixedRouter {
    places: Vec<String>,
}

impl FixedRouter {
    pub fn new<S: Into<String>>(places: impl IntoIterator<Item = S>) -> Self {
        FixedRouter { places: places.into_iter().map(Into::into).collect() }
    }
}

impl Router for FixedRouter {
    fn route(
        &self,
        net: &NetDefinition,
        _transition_id: TransitionId,
        _marking: &MarkingSnapshot,
    ) -> Result<OutputSelection> {
        let names: Vec<&str> = self.places.iter().map(String::as_str).collect();
        OutputSelection::by_names(net, &names)
    }
}

/// Routers registered per transition name, with a fallback for all others.
pub struct RouterRegistry {
    routers: HashMap<String, Box<dyn Router>>,
    fallback: Box<dyn Router>,
}

impl Default for RouterRegistry {
    fn default() -> Self {
        RouterRegistry { routers: HashMap::new(), fallback: Box::new(DefaultRouter) }
    }
}

impl RouterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(fallback: impl Router + 'static) -> Self {
        RouterRegistry { routers: HashMap::new(), fallback: Box::new(fallback) }
    }

    pub fn register(&mut self, transition_name: &str, router: impl Router + 'static) {
        self.routers.insert(transition_name.into(), Box::new(router));
    }

    pub fn contains(&self, transition_name: &str) -> bool {
        self.routers.contains_key(transition_name)
    }
}

impl Router for RouterRegistry {
    fn route(
        &self,
        net: &NetDefinition,
        transition_id: TransitionId,
        marking: &MarkingSnapshot,
    ) -> Result<OutputSelection> {
        let name = net.transition(transition_id).name();
        match self.routers.get(name) {
            Some(router) => router.route(net, transition_id, marking),
            None => self.fallback.route(net, transition_id, marking),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        marking::Marking,
        net::{JoinType, NetDefinitionBuilder, Place, Transition},
    };

    fn net() -> NetDefinition {
        let mut net = NetDefinitionBuilder::default();
        net.insert_place(Place::source("i"));
        net.insert_place(Place::internal("a"));
        net.insert_place(Place::internal("b"));
        net.insert_place(Place::sink("o"));
        net.insert_transition(Transition::new("choose", JoinType::Xor, SplitType::Xor));
        net.insert_transition(Transition::new("spread", JoinType::Xor, SplitType::Or));
        net.insert_transition(Transition::new("join", JoinType::Or, SplitType::And));
        net.flow_in("i", "choose").unwrap();
        net.flow_in("i", "spread").unwrap();
        for split in ["choose", "spread"] {
            net.flow_out(split, "a").unwrap();
            net.flow_out(split, "b").unwrap();
        }
        net.flow_in("a", "join").unwrap();
        net.flow_in("b", "join").unwrap();
        net.flow_out("join", "o").unwrap();
        net.build().unwrap()
    }

    #[test]
    fn default_routes() {
        let net = net();
        let snapshot = Marking::initial(&net).snapshot();
        let choose = net.transition_id("choose").unwrap();
        let spread = net.transition_id("spread").unwrap();
        let a = net.place_id("a").unwrap();
        assert_eq!(DefaultRouter.route(&net, choose, &snapshot).unwrap().places(), &[a]);
        assert_eq!(DefaultRouter.route(&net, spread, &snapshot).unwrap().len(), 2);
    }

    #[test]
    fn registry_by_name() {
        let net = net();
        let snapshot = Marking::initial(&net).snapshot();
        let mut registry = RouterRegistry::new();
        registry.register("spread", FixedRouter::new(["b"]));
        assert!(registry.contains("spread"));
        let spread = net.transition_id("spread").unwrap();
        let choose = net.transition_id("choose").unwrap();
        let b = net.place_id("b").unwrap();
        assert_eq!(registry.route(&net, spread, &snapshot).unwrap().places(), &[b]);
        assert_eq!(registry.route(&net, choose, &snapshot).unwrap().len(), 1);

        let registry = RouterRegistry::with_fallback(FixedRouter::new(["b"]));
        assert_eq!(registry.route(&net, choose, &snapshot).unwrap().places(), &[b]);
    }
}
