//! Claimed event positions and fields, as handed over by the ingestion
//! layer.
//!
//! Claims are plain data so they can live inside pending resources and
//! survive checkpoint round-trips; the verification closures over them
//! are rebuilt from these fields, never persisted.

use borsh::{BorshDeserialize, BorshSerialize};
use trestle_bridge_types::{SignerEventKind, StakeEventKind, StakeLinkingFact};
use trestle_primitives::{Buf20, Buf32, U256};

/// A claimed stake deposited/removed event.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct StakeClaim {
    pub party: String,
    pub kind: StakeEventKind,
    pub amount: U256,
    pub block_number: u64,
    pub log_index: u32,
    pub tx_hash: Buf32,
}

impl From<&StakeLinkingFact> for StakeClaim {
    fn from(fact: &StakeLinkingFact) -> Self {
        Self {
            party: fact.party.clone(),
            kind: fact.kind,
            amount: fact.amount,
            block_number: fact.block_height,
            log_index: fact.log_index,
            tx_hash: fact.tx_hash,
        }
    }
}

/// A claimed signer added/removed event.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct SignerClaim {
    pub address: Buf20,
    pub kind: SignerEventKind,
    pub nonce: U256,
    pub block_number: u64,
    pub log_index: u32,
    pub tx_hash: Buf32,
}

/// A claimed threshold set event.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct ThresholdClaim {
    pub threshold: u16,
    pub nonce: U256,
    pub block_number: u64,
    pub log_index: u32,
    pub tx_hash: Buf32,
}
