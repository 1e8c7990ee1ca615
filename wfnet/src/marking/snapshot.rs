use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::net::PlaceId;

/// Immutable copy of a [`Marking`](super::Marking).
///
/// Cloning is cheap, the counts are shared.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MarkingSnapshot {
    tokens: Arc<[u32]>,
}

impl MarkingSnapshot {
    pub(super) fn new(tokens: Vec<u32>) -> Self {
        MarkingSnapshot { tokens: tokens.into() }
    }

    pub fn counts(&self) -> &[u32] {
        &self.tokens
    }

    pub fn token_count(&self, place_id: PlaceId) -> u32 {
        self.tokens.get(place_id.0).copied().unwrap_or(0)
    }

    pub fn is_marked(&self, place_id: PlaceId) -> bool {
        self.token_count(place_id) > 0
    }

    pub fn marked_places(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.tokens.iter().enumerate().filter(|(_, &count)| count > 0).map(|(idx, _)| PlaceId(idx))
    }

    pub fn total_tokens(&self) -> u64 {
        self.tokens.iter().map(|&count| count as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.iter().all(|&count| count == 0)
    }

    /// Every place holds at least as many tokens as in `other`.
    pub fn covers(&self, other: &MarkingSnapshot) -> bool {
        let len = self.tokens.len().max(other.tokens.len());
        (0..len).all(|idx| self.token_count(PlaceId(idx)) >= other.token_count(PlaceId(idx)))
    }

    pub fn is_covered_by(&self, other: &MarkingSnapshot) -> bool {
        other.covers(self)
    }

    /// Covers `other` and holds strictly more tokens on at least one place.
    pub fn strictly_covers(&self, other: &MarkingSnapshot) -> bool {
        self.covers(other) && self.total_tokens() > other.total_tokens()
    }
}

/// Persisted form of a marking: token counts keyed by place name, empty places omitted.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct SerializableMarking {
    pub tokens: BTreeMap<String, u32>,
}
