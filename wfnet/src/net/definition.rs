use std::collections::HashMap;

use super::{common::CancellationSet, Place, PlaceId, Transition, TransitionId};

/// Immutable workflow net.
///
/// Places and transitions live in arenas indexed by [`PlaceId`] and [`TransitionId`]. Adjacency is
/// stored in both directions so that presets, postsets and cancellation sets are plain slice
/// lookups. Only [`NetDefinitionBuilder::build`](super::NetDefinitionBuilder::build) creates
/// instances, and only after validation succeeded.
#[derive(Debug)]
pub struct NetDefinition {
    pub(super) places: Vec<Place>,
    pub(super) transitions: Vec<Transition>,
    pub(super) place_ids: HashMap<String, PlaceId>,
    pub(super) transition_ids: HashMap<String, TransitionId>,
    pub(super) preset: Vec<Vec<PlaceId>>,
    pub(super) postset: Vec<Vec<PlaceId>>,
    pub(super) consumers: Vec<Vec<TransitionId>>,
    pub(super) producers: Vec<Vec<TransitionId>>,
    pub(super) cancellation: Vec<CancellationSet>,
    pub(super) source: PlaceId,
    pub(super) sink: PlaceId,
}

impl NetDefinition {
    pub fn place_count(&self) -> usize {
        self.places.len()
    }

    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    pub fn place(&self, place_id: PlaceId) -> &Place {
        &self.places[place_id.0]
    }

    pub fn transition(&self, transition_id: TransitionId) -> &Transition {
        &self.transitions[transition_id.0]
    }

    pub fn place_ids(&self) -> impl Iterator<Item = PlaceId> {
        (0..self.places.len()).map(PlaceId)
    }

    pub fn transition_ids(&self) -> impl Iterator<Item = TransitionId> {
        (0..self.transitions.len()).map(TransitionId)
    }

    pub fn place_id(&self, name: &str) -> Option<PlaceId> {
        self.place_ids.get(name).copied()
    }

    pub fn transition_id(&self, name: &str) -> Option<TransitionId> {
        self.transition_ids.get(name).copied()
    }

    pub fn contains_place(&self, place_id: PlaceId) -> bool {
        place_id.0 < self.places.len()
    }

    pub fn contains_transition(&self, transition_id: TransitionId) -> bool {
        transition_id.0 < self.transitions.len()
    }

    pub fn preset(&self, transition_id: TransitionId) -> &[PlaceId] {
        &self.preset[transition_id.0]
    }

    pub fn postset(&self, transition_id: TransitionId) -> &[PlaceId] {
        &self.postset[transition_id.0]
    }

    pub fn cancellation_set(&self, transition_id: TransitionId) -> &CancellationSet {
        &self.cancellation[transition_id.0]
    }

    /// Transitions having `place_id` in their preset.
    pub fn consumers(&self, place_id: PlaceId) -> &[TransitionId] {
        &self.consumers[place_id.0]
    }

    /// Transitions having `place_id` in their postset.
    pub fn producers(&self, place_id: PlaceId) -> &[TransitionId] {
        &self.producers[place_id.0]
    }

    pub fn source(&self) -> PlaceId {
        self.source
    }

    pub fn sink(&self) -> PlaceId {
        self.sink
    }
}
