//! Append-only per-party ledger of witnessed stake facts.
//!
//! Pure computation, no I/O. Facts only enter through the tick path
//! (the stake verifier applies them once accepted); balance getters are
//! also served to read-only API handlers, so the maps sit behind a
//! read-write lock used strictly for point reads.

mod errors;
mod ledger;

pub use errors::{LedgerError, LedgerResult};
pub use ledger::EventLedger;
