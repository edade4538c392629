//! Witness coordination: asynchronous verification, synchronous
//! application.
//!
//! Checks run as tokio tasks off the deterministic execution path and
//! may take as long as they need; their boolean outcomes land in a
//! queue that the owner drains from its tick handler. Protocol state
//! only ever changes on the tick path, so every replica applies
//! resolutions in the order its consensus-driven ticks observe them.

mod coordinator;
mod error;

pub use coordinator::{CheckFuture, WitnessCoordinator};
pub use error::{CheckError, WitnessError};
