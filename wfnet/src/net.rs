mod builder;
mod common;
mod definition;
mod validate;

pub use builder::NetDefinitionBuilder;
pub use common::{
    Arc, ArcVariant, CancellationSet, JoinType, Place, PlaceId, PlaceKind, SplitType, Transition,
    TransitionId,
};
pub use definition::NetDefinition;
