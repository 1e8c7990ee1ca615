use std::fmt::Display;

#[derive(Eq, PartialEq, Clone, Copy, PartialOrd, Ord, Hash, Debug)]
pub struct PlaceId(pub usize);
#[derive(Eq, PartialEq, Clone, Copy, PartialOrd, Ord, Hash, Debug)]
pub struct TransitionId(pub usize);

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum PlaceKind {
    Source,
    Sink,
    Internal,
}

/// Rule deciding when a transition may consume from its preset.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum JoinType {
    And,
    Xor,
    Or,
}

/// Rule deciding which postset places receive a token when a transition fires.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum SplitType {
    And,
    Xor,
    Or,
}

#[derive(Clone, Debug)]
pub struct Place {
    name: String,
    kind: PlaceKind,
}

impl Place {
    pub fn new(name: impl Into<String>, kind: PlaceKind) -> Self {
        Place { name: name.into(), kind }
    }

    pub fn source(name: impl Into<String>) -> Self {
        Place::new(name, PlaceKind::Source)
    }

    pub fn sink(name: impl Into<String>) -> Self {
        Place::new(name, PlaceKind::Sink)
    }

    pub fn internal(name: impl Into<String>) -> Self {
        Place::new(name, PlaceKind::Internal)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PlaceKind {
        self.kind
    }
}

#[derive(Clone, Debug)]
pub struct Transition {
    name: String,
    join: JoinType,
    split: SplitType,
}

impl Transition {
    pub fn new(name: impl Into<String>, join: JoinType, split: SplitType) -> Self {
        Transition { name: name.into(), join, split }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn join(&self) -> JoinType {
        self.join
    }

    pub fn split(&self) -> SplitType {
        self.split
    }
}

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum ArcVariant {
    /// place -> transition
    In,
    /// transition -> place
    Out,
}

impl ArcVariant {
    pub fn is_in(&self) -> bool {
        *self == Self::In
    }

    pub fn is_out(&self) -> bool {
        *self == Self::Out
    }
}

#[derive(Clone, Debug)]
pub struct Arc {
    place: String,
    transition: String,
    variant: ArcVariant,
}

impl Arc {
    pub fn new(place: impl Into<String>, transition: impl Into<String>, variant: ArcVariant) -> Self {
        Arc { place: place.into(), transition: transition.into(), variant }
    }

    pub fn place(&self) -> &str {
        &self.place
    }

    pub fn transition(&self) -> &str {
        &self.transition
    }

    pub fn variant(&self) -> ArcVariant {
        self.variant
    }
}

/// Places and transitions cleared when the owning transition fires.
#[derive(Clone, Default, Debug)]
pub struct CancellationSet {
    pub(super) places: Vec<PlaceId>,
    pub(super) transitions: Vec<TransitionId>,
}

impl CancellationSet {
    pub fn places(&self) -> &[PlaceId] {
        &self.places
    }

    pub fn transitions(&self) -> &[TransitionId] {
        &self.transitions
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty() && self.transitions.is_empty()
    }
}

impl Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}", self.0)
    }
}

impl Display for TransitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::And => write!(f, "AND"),
            JoinType::Xor => write!(f, "XOR"),
            JoinType::Or => write!(f, "OR"),
        }
    }
}

impl Display for SplitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitType::And => write!(f, "AND"),
            SplitType::Xor => write!(f, "XOR"),
            SplitType::Or => write!(f, "OR"),
        }
    }
}
