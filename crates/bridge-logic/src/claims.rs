//! Pending resources tracked by the domain verifiers.
//!
//! Each variant is plain data so the pending queues survive checkpoint
//! round-trips; the witness closures over them are rebuilt by the
//! [`crate::CheckFactory`] and never serialized.

use borsh::{BorshDeserialize, BorshSerialize};
use trestle_bridge_types::{SignerFact, StakeLinkingFact, ThresholdFact};
use trestle_primitives::{hash, Buf32, U256};

/// A pending resource owned by the stake verifier.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum StakePending {
    /// A claimed stake deposited/removed event awaiting its witness.
    Linking(StakeLinkingFact),

    /// A watch that the bridge's total staked supply equals `expected`.
    TotalSupply { id: String, expected: U256 },

    /// A watch that the foreign chain has progressed to `block`.
    Heartbeat { id: String, block: u64 },
}

impl StakePending {
    /// The unique resource id registered with the witness coordinator.
    pub fn id(&self) -> &str {
        match self {
            Self::Linking(fact) => &fact.id,
            Self::TotalSupply { id, .. } => id,
            Self::Heartbeat { id, .. } => id,
        }
    }

    /// Content hash for dedup. The watch id never feeds the hash, so a
    /// resubmission of the same watch under a fresh id still collides.
    pub fn content_hash(&self) -> Buf32 {
        match self {
            Self::Linking(fact) => fact.content_hash(),
            Self::TotalSupply { expected, .. } => hash::sha256_borsh(&(1u8, expected)),
            Self::Heartbeat { block, .. } => hash::sha256_borsh(&(2u8, block)),
        }
    }

    /// The foreign-chain block the claim references, if any.
    pub fn block(&self) -> Option<u64> {
        match self {
            Self::Linking(fact) => Some(fact.block_height),
            Self::TotalSupply { .. } => None,
            Self::Heartbeat { block, .. } => Some(*block),
        }
    }
}

/// A pending resource owned by the multisig topology.
#[derive(Clone, Debug, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum ControlPending {
    Signer(SignerFact),
    Threshold(ThresholdFact),
}

impl ControlPending {
    pub fn id(&self) -> &str {
        match self {
            Self::Signer(fact) => &fact.id,
            Self::Threshold(fact) => &fact.id,
        }
    }

    pub fn content_hash(&self) -> Buf32 {
        match self {
            Self::Signer(fact) => fact.content_hash(),
            Self::Threshold(fact) => fact.content_hash(),
        }
    }

    pub fn block(&self) -> u64 {
        match self {
            Self::Signer(fact) => fact.block_number,
            Self::Threshold(fact) => fact.block_number,
        }
    }
}

