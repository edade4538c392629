//! Signature aggregation behind a validator quorum.
//!
//! The notary collects per-validator signatures for attestable
//! resources (withdrawal approvals, bridge control operations) and
//! certifies an aggregate once enough of the current validator set has
//! signed. It runs entirely on the deterministic tick path.

mod notary;
mod tracker;
mod traits;

pub use notary::{Notary, NotaryConfig, NotaryError};
pub use traits::{SignatureBroadcaster, ValidatorTopology};
