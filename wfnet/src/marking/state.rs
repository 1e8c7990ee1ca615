use crate::{
    error::{assert_state, Result, WorkflowError},
    net::{NetDefinition, PlaceId},
};

use super::{MarkingSnapshot, SerializableMarking};

/// Token counts of one case, indexed by [`PlaceId`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Marking {
    tokens: Vec<u32>,
}

macro_rules! get_count {
    ($self:expr, $place_id:expr) => {
        $self.tokens.get_mut($place_id.0).ok_or_else(|| {
            WorkflowError::ValueError(format!("Marking has no place '{}'", $place_id.0))
        })
    };
}

impl Marking {
    /// Empty marking over all places of `net`.
    pub fn new(net: &NetDefinition) -> Self {
        Marking { tokens: vec![0; net.place_count()] }
    }

    /// Marking of a freshly launched case: a single token on the source place.
    pub fn initial(net: &NetDefinition) -> Self {
        let mut marking = Marking::new(net);
        marking.tokens[net.source().0] = 1;
        marking
    }

    pub fn from_snapshot(snapshot: &MarkingSnapshot) -> Self {
        Marking { tokens: snapshot.counts().to_vec() }
    }

    /// Rebuild a marking from its persisted form. Unknown place names are rejected.
    pub fn from_serializable(net: &NetDefinition, data: &SerializableMarking) -> Result<Self> {
        let mut marking = Marking::new(net);
        for (name, &count) in &data.tokens {
            let pl_id = net.place_id(name).ok_or_else(|| {
                WorkflowError::ValueError(format!("Persisted marking refers to unknown place '{name}'"))
            })?;
            marking.tokens[pl_id.0] = count;
        }
        Ok(marking)
    }

    pub fn to_serializable(&self, net: &NetDefinition) -> SerializableMarking {
        SerializableMarking {
            tokens: self
                .marked_places()
                .map(|pl_id| (net.place(pl_id).name().to_string(), self.tokens[pl_id.0]))
                .collect(),
        }
    }

    pub fn place_count(&self) -> usize {
        self.tokens.len()
    }

    pub fn token_count(&self, place_id: PlaceId) -> u32 {
        self.tokens.get(place_id.0).copied().unwrap_or(0)
    }

    pub fn is_marked(&self, place_id: PlaceId) -> bool {
        self.token_count(place_id) > 0
    }

    pub fn add_tokens(&mut self, place_id: PlaceId, n: u32) -> Result<()> {
        let count = get_count!(self, place_id)?;
        *count = count.checked_add(n).ok_or_else(|| {
            WorkflowError::IllegalState(format!("Token count of place '{}' overflows", place_id.0))
        })?;
        Ok(())
    }

    /// Remove `n` tokens. Fails without modification if the place holds fewer than `n` tokens.
    pub fn remove_tokens(&mut self, place_id: PlaceId, n: u32) -> Result<()> {
        let count = get_count!(self, place_id)?;
        assert_state!(
            *count >= n,
            format!("Cannot remove {} tokens from place '{}' holding {}", n, place_id.0, *count)
        )?;
        *count -= n;
        Ok(())
    }

    /// Empty a single place and return the number of removed tokens.
    pub fn clear_place(&mut self, place_id: PlaceId) -> Result<u32> {
        let count = get_count!(self, place_id)?;
        Ok(std::mem::take(count))
    }

    /// Remove every token.
    pub fn clear(&mut self) {
        self.tokens.iter_mut().for_each(|count| *count = 0);
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

    /// Immutable copy of the current state.
    pub fn snapshot(&self) -> MarkingSnapshot {
        MarkingSnapshot::new(self.tokens.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::{JoinType, NetDefinitionBuilder, Place, SplitType, Transition};

    fn net() -> NetDefinition {
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
        net.build().unwrap()
    }

    #[test]
    fn initial_marks_source() {
        let net = net();
        let marking = Marking::initial(&net);
        assert_eq!(marking.token_count(net.source()), 1);
        assert_eq!(marking.total_tokens(), 1);
        assert_eq!(marking.marked_places().collect::<Vec<_>>(), vec![PlaceId(0)]);
    }

    #[test]
    fn remove_never_clamps() {
        let net = net();
        let mut marking = Marking::new(&net);
        marking.add_tokens(PlaceId(1), 2).unwrap();
        let err = marking.remove_tokens(PlaceId(1), 3).unwrap_err();
        assert!(matches!(err, WorkflowError::IllegalState(_)));
        assert_eq!(marking.token_count(PlaceId(1)), 2);
        marking.remove_tokens(PlaceId(1), 2).unwrap();
        assert!(marking.is_empty());
    }

    #[test]
    fn unknown_place() {
        let net = net();
        let mut marking = Marking::new(&net);
        assert_eq!(marking.token_count(PlaceId(17)), 0);
        assert!(matches!(marking.add_tokens(PlaceId(17), 1), Err(WorkflowError::ValueError(_))));
    }

    #[test]
    fn snapshot_is_detached() {
        let net = net();
        let mut marking = Marking::initial(&net);
        let snapshot = marking.snapshot();
        marking.clear();
        assert_eq!(snapshot.token_count(net.source()), 1);
        assert_eq!(Marking::from_snapshot(&snapshot), Marking::initial(&net));
    }

    #[test]
    fn persisted_form_uses_place_names() {
        let net = net();
        let mut marking = Marking::new(&net);
        marking.add_tokens(PlaceId(1), 3).unwrap();
        let data = marking.to_serializable(&net);
        assert_eq!(data.tokens.len(), 1);
        assert_eq!(data.tokens["c"], 3);

        let json = serde_json::to_string(&data).unwrap();
        let data: SerializableMarking = serde_json::from_str(&json).unwrap();
        assert_eq!(Marking::from_serializable(&net, &data).unwrap(), marking);

        let mut broken = data.clone();
        broken.tokens.insert("nope".into(), 1);
        assert!(Marking::from_serializable(&net, &broken).is_err());
    }
}
