//! Domain verifiers for the foreign-chain bridge.
//!
//! [`StakeVerifier`] and [`MultisigTopology`] own the pending and
//! finalized queues for their event kind. Ingestion hands them claimed
//! events; they deduplicate, schedule on-chain witness checks through a
//! [`trestle_witness::WitnessCoordinator`], and apply accepted facts to
//! the stake ledger and the signer set on the deterministic tick path.

pub mod claims;
pub mod errors;
pub mod factory;
pub mod stake_verifier;
pub mod topology;

pub use claims::{ControlPending, StakePending};
pub use errors::{VerifierError, VerifierResult};
pub use factory::{CheckFactory, CheckFn};
pub use stake_verifier::StakeVerifier;
pub use topology::MultisigTopology;
