use std::fmt::Display;

use crate::net::{PlaceId, TransitionId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkingChange {
    // changes of a firing (with the transition that is responsible)
    Consume(PlaceId, TransitionId),
    Produce(PlaceId, TransitionId),
    Cancel(PlaceId, TransitionId, u32), // number of removed tokens
    // case level interactions
    Reset(),
    Restore(),
}

/// Everything a single firing did to a marking, in application order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiringRecord {
    pub transition: TransitionId,
    pub changes: Vec<MarkingChange>,
}

impl FiringRecord {
    pub fn new(transition: TransitionId) -> Self {
        FiringRecord { transition, changes: Default::default() }
    }

    pub fn consumed(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.changes.iter().filter_map(|c| match c {
            MarkingChange::Consume(pl_id, _) => Some(*pl_id),
            _ => None,
        })
    }

    pub fn produced(&self) -> impl Iterator<Item = PlaceId> + '_ {
        self.changes.iter().filter_map(|c| match c {
            MarkingChange::Produce(pl_id, _) => Some(*pl_id),
            _ => None,
        })
    }

    /// Places emptied by the cancellation set, with the number of removed tokens.
    pub fn cancelled(&self) -> impl Iterator<Item = (PlaceId, u32)> + '_ {
        self.changes.iter().filter_map(|c| match c {
            MarkingChange::Cancel(pl_id, _, count) => Some((*pl_id, *count)),
            _ => None,
        })
    }
}

impl Display for FiringRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "transition={}, changes=[", self.transition.0)?;
        for (idx, change) in self.changes.iter().enumerate() {
            if idx == 0 {
                write!(f, "{}", change)?;
            } else {
                write!(f, ", {}", change)?;
            }
        }
        write!(f, "]")?;
        Ok(())
    }
}

impl Display for MarkingChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkingChange::Consume(place_id, transition_id) => {
                write!(f, "Consume({} <- {})", transition_id.0, place_id.0)
            }
            MarkingChange::Produce(place_id, transition_id) => {
                write!(f, "Produce({} -> {})", transition_id.0, place_id.0)
            }
            MarkingChange::Cancel(place_id, transition_id, count) => {
                write!(f, "Cancel({} tokens at {} by {})", count, place_id.0, transition_id.0)
            }
            MarkingChange::Reset() => write!(f, "Reset()"),
            MarkingChange::Restore() => write!(f, "Restore()"),
        }
    }
}
