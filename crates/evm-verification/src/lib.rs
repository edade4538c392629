//! On-chain verification of claimed bridge events.
//!
//! Each function re-runs a log filter query scoped to exactly the
//! claimed block against the known contract addresses and accepts only
//! if a log exists at the claimed `(block, log index, tx hash)` position
//! whose decoded fields match the claim exactly, then requires the
//! configured confirmation depth. These are the `check` bodies of the
//! pending-resource pattern: stateless and safe to call repeatedly.

pub mod claims;
pub mod error;
pub mod multisig;
pub mod stake;

pub use claims::{SignerClaim, StakeClaim, ThresholdClaim};
pub use error::{VerificationError, VerificationResult};
pub use multisig::{verify_signer_event, verify_threshold_set};
pub use stake::{verify_stake_event, verify_stake_total_supply};
