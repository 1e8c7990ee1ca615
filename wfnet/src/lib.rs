//! Enablement and firing kernel for workflow nets with AND, XOR and OR joins and splits,
//! cancellation regions and an OR-join decided by reset-net coverability analysis.

pub mod analysis;
pub mod error;
pub mod exec;
pub mod marking;
pub mod net;
pub mod runner;
