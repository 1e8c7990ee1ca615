use std::collections::HashMap;

use tracing::debug;

use crate::error::{Result, WorkflowError};

use super::{
    common::CancellationSet, validate, Arc, ArcVariant, NetDefinition, Place, PlaceId, Transition,
    TransitionId,
};

/// Name-keyed description of a workflow net.
///
/// Places, transitions and arcs keep their insertion order; preset and postset order of the built
/// [`NetDefinition`] follows the order in which arcs were inserted.
#[derive(Default, Clone)]
pub struct NetDefinitionBuilder {
    places: Vec<Place>,
    place_names: HashMap<String, usize>,
    transitions: Vec<Transition>,
    transition_names: HashMap<String, usize>,
    arcs: Vec<Arc>,
    arc_keys: HashMap<(String, String, ArcVariant), usize>,
    cancellations: Vec<(String, String)>, // (transition name, cancelled element name)
}

impl NetDefinitionBuilder {
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty() && self.transitions.is_empty() && self.arcs.is_empty()
    }

    /// Insert place into this net.
    ///
    /// Returns the replaced place for this name, or None if the name is not in use.
    pub fn insert_place(&mut self, place: Place) -> Option<Place> {
        match self.place_names.get(place.name()) {
            Some(&idx) => Some(std::mem::replace(&mut self.places[idx], place)),
            None => {
                self.place_names.insert(place.name().to_string(), self.places.len());
                self.places.push(place);
                None
            }
        }
    }

    /// Insert transition into this net.
    ///
    /// Returns the replaced transition for this name, or None if the name is not in use.
    pub fn insert_transition(&mut self, transition: Transition) -> Option<Transition> {
        match self.transition_names.get(transition.name()) {
            Some(&idx) => Some(std::mem::replace(&mut self.transitions[idx], transition)),
            None => {
                self.transition_names
                    .insert(transition.name().to_string(), self.transitions.len());
                self.transitions.push(transition);
                None
            }
        }
    }

    /// Insert arc into this net.
    ///
    /// Both endpoints must already exist. Returns the replaced arc, or None if there was no arc
    /// with the same endpoints and direction.
    pub fn insert_arc(&mut self, arc: Arc) -> Result<Option<Arc>> {
        let place_name = arc.place();
        let transition_name = arc.transition();
        if !self.place_names.contains_key(place_name) {
            return Err(WorkflowError::Structure(format!(
                "Arc '{place_name}' <-> '{transition_name}' cannot be added, place does not exist."
            )));
        };
        if !self.transition_names.contains_key(transition_name) {
            return Err(WorkflowError::Structure(format!(
                "Arc '{place_name}' <-> '{transition_name}' cannot be added, transition does not exist."
            )));
        };
        let key = (place_name.to_string(), transition_name.to_string(), arc.variant());
        match self.arc_keys.get(&key) {
            Some(&idx) => Ok(Some(std::mem::replace(&mut self.arcs[idx], arc))),
            None => {
                self.arc_keys.insert(key, self.arcs.len());
                self.arcs.push(arc);
                Ok(None)
            }
        }
    }

    /// Convenience for `insert_arc(Arc::new(place, transition, ArcVariant::In))`.
    pub fn flow_in(&mut self, place: &str, transition: &str) -> Result<()> {
        self.insert_arc(Arc::new(place, transition, ArcVariant::In)).map(|_| ())
    }

    /// Convenience for `insert_arc(Arc::new(place, transition, ArcVariant::Out))`.
    pub fn flow_out(&mut self, transition: &str, place: &str) -> Result<()> {
        self.insert_arc(Arc::new(place, transition, ArcVariant::Out)).map(|_| ())
    }

    /// Add `element` (a place or transition name) to the cancellation set of `transition`.
    pub fn insert_cancellation(&mut self, transition: &str, element: &str) -> Result<()> {
        if !self.transition_names.contains_key(transition) {
            return Err(WorkflowError::Structure(format!(
                "Cancellation on '{transition}' cannot be added, transition does not exist."
            )));
        }
        if !self.place_names.contains_key(element) && !self.transition_names.contains_key(element)
        {
            return Err(WorkflowError::Structure(format!(
                "Cancellation of '{element}' by '{transition}' cannot be added, element does not exist."
            )));
        }
        let entry = (transition.to_string(), element.to_string());
        if !self.cancellations.contains(&entry) {
            self.cancellations.push(entry);
        }
        Ok(())
    }

    /// Build and validate the net.
    ///
    /// Fails with [`WorkflowError::Structure`] if the net is not a well-formed workflow net. Ids
    /// are arena indices following insertion order.
    pub fn build(&self) -> Result<NetDefinition> {
        let mut preset = vec![Vec::<PlaceId>::new(); self.transitions.len()];
        let mut postset = vec![Vec::<PlaceId>::new(); self.transitions.len()];
        let mut consumers = vec![Vec::<TransitionId>::new(); self.places.len()];
        let mut producers = vec![Vec::<TransitionId>::new(); self.places.len()];

        for arc in &self.arcs {
            let pl_id = PlaceId(self.place_index(arc.place())?);
            let tr_id = TransitionId(self.transition_index(arc.transition())?);
            match arc.variant() {
                ArcVariant::In => {
                    preset[tr_id.0].push(pl_id);
                    consumers[pl_id.0].push(tr_id);
                }
                ArcVariant::Out => {
                    postset[tr_id.0].push(pl_id);
                    producers[pl_id.0].push(tr_id);
                }
            }
        }

        let mut cancellation = vec![CancellationSet::default(); self.transitions.len()];
        for (tr_name, element) in &self.cancellations {
            let tr_idx = self.transition_index(tr_name)?;
            if let Some(&pl_idx) = self.place_names.get(element) {
                cancellation[tr_idx].places.push(PlaceId(pl_idx));
            } else {
                let cancelled = self.transition_index(element)?;
                cancellation[tr_idx].transitions.push(TransitionId(cancelled));
            }
        }

        let (source, sink) = validate::source_and_sink(&self.places)?;
        let net = NetDefinition {
            place_ids: self.place_names.iter().map(|(k, &v)| (k.clone(), PlaceId(v))).collect(),
            transition_ids: self
                .transitions
                .iter()
                .enumerate()
                .map(|(idx, tr)| (tr.name().to_string(), TransitionId(idx)))
                .collect(),
            places: self.places.clone(),
            transitions: self.transitions.clone(),
            preset,
            postset,
            consumers,
            producers,
            cancellation,
            source,
            sink,
        };
        validate::well_formed(&net)?;

        let places = net.places.len();
        let transitions = net.transitions.len();
        let arcs = self.arcs.len();
        debug!(places, transitions, arcs, "Constructed net definition.");
        Ok(net)
    }

    fn place_index(&self, name: &str) -> Result<usize> {
        self.place_names
            .get(name)
            .copied()
            .ok_or_else(|| WorkflowError::Structure(format!("Place '{name}' does not exist.")))
    }

    fn transition_index(&self, name: &str) -> Result<usize> {
        self.transition_names
            .get(name)
            .copied()
            .ok_or_else(|| WorkflowError::Structure(format!("Transition '{name}' does not exist.")))
    }
}
