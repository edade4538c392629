//! Shared data model for foreign-chain bridge facts.
//!
//! These are the types that flow between the domain verifiers, the event
//! ledger, the notary and the broker. Everything here is plain data:
//! borsh-serializable for checkpoints and snapshots, serde-serializable
//! for external observers.

pub mod broker;
pub mod events;
pub mod multisig;
pub mod signature;
pub mod stake;

pub use broker::Broker;
pub use events::{BridgeEvent, Resolution};
pub use multisig::{SignerEventKind, SignerFact, ThresholdFact};
pub use signature::{NodeSignature, SignatureKind};
pub use stake::{StakeEventKind, StakeLinkingFact, StakeStatus};
