//! Signer-set and threshold facts from the multisig control bridge.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use trestle_primitives::{hash, Buf20, Buf32, U256};

/// Whether a signer event adds or removes a signer from the bridge
/// multisig.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub enum SignerEventKind {
    Added,
    Removed,
}

/// A signer added/removed event observed on the multisig control
/// contract.
#[derive(
    Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct SignerFact {
    /// Globally unique event id.
    pub id: String,

    /// The signer address the event concerns.
    pub address: Buf20,

    pub kind: SignerEventKind,

    pub block_number: u64,

    pub log_index: u32,

    pub tx_hash: Buf32,

    /// Submitter nonce carried by the contract event.
    pub nonce: U256,

    /// Foreign-chain block time of the event, unix seconds. Resolution
    /// ties between facts for the same address are broken by the
    /// greatest block time.
    pub block_time: i64,
}

impl SignerFact {
    /// Content hash over the discriminating on-chain fields. The event
    /// id is excluded so a resubmission under a fresh id still dedups.
    pub fn content_hash(&self) -> Buf32 {
        hash::sha256_borsh(&(
            self.address,
            self.kind,
            self.block_number,
            self.log_index,
            self.tx_hash,
            self.nonce,
        ))
    }
}

/// A threshold replacement event observed on the multisig control
/// contract.
#[derive(
    Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct ThresholdFact {
    /// Globally unique event id.
    pub id: String,

    /// New signature threshold, in basis points of the signer set.
    pub threshold: u16,

    pub block_number: u64,

    pub log_index: u32,

    pub tx_hash: Buf32,

    pub nonce: U256,

    /// Foreign-chain block time, unix seconds. The greatest block time
    /// wins when several threshold facts resolve in one tick.
    pub block_time: i64,
}

impl ThresholdFact {
    pub fn content_hash(&self) -> Buf32 {
        hash::sha256_borsh(&(
            self.threshold,
            self.block_number,
            self.log_index,
            self.tx_hash,
            self.nonce,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signer_hash_ignores_block_time() {
        let a = SignerFact {
            id: "s-1".into(),
            address: Buf20::from([2; 20]),
            kind: SignerEventKind::Added,
            block_number: 9,
            log_index: 3,
            tx_hash: Buf32::from([4; 32]),
            nonce: U256::from(1u64),
            block_time: 1000,
        };
        let mut b = a.clone();
        b.block_time = 2000;
        // Block time is resolution metadata, not identity.
        assert_eq!(a.content_hash(), b.content_hash());
        b.nonce = U256::from(2u64);
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_hashes_ignore_event_id() {
        let a = SignerFact {
            id: "s-1".into(),
            address: Buf20::from([2; 20]),
            kind: SignerEventKind::Added,
            block_number: 9,
            log_index: 3,
            tx_hash: Buf32::from([4; 32]),
            nonce: U256::from(1u64),
            block_time: 1000,
        };
        let mut b = a.clone();
        b.id = "s-1-retry".into();
        assert_eq!(a.content_hash(), b.content_hash());

        let t = ThresholdFact {
            id: "t-1".into(),
            threshold: 6600,
            block_number: 9,
            log_index: 4,
            tx_hash: Buf32::from([4; 32]),
            nonce: U256::from(1u64),
            block_time: 1000,
        };
        let mut u = t.clone();
        u.id = "t-1-retry".into();
        assert_eq!(t.content_hash(), u.content_hash());
    }
}
