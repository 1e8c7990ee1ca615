mod change;
mod snapshot;
mod state;

pub use change::{FiringRecord, MarkingChange};
pub use snapshot::{MarkingSnapshot, SerializableMarking};
pub use state::Marking;
