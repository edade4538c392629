//! Stake linking facts sourced from the foreign-chain staking bridge.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trestle_primitives::{hash, Buf32, U256};

/// Whether a stake linking fact credits or debits a party's stake.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub enum StakeEventKind {
    /// Stake was deposited into the bridge on behalf of the party.
    Deposited,
    /// Stake was removed from the bridge.
    Removed,
}

/// Verification status of a stake linking fact.
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
pub enum StakeStatus {
    /// Queued, witness check not yet resolved.
    Pending,
    /// Witnessed on the foreign chain and applied to the ledger.
    Accepted,
    /// Witness check resolved negative; never applied.
    Rejected,
}

/// Problems with the shape of a stake linking fact, before any chain
/// verification happens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidStakeFact {
    #[error("stake fact has empty id")]
    MissingId,

    #[error("stake fact has empty party")]
    MissingParty,

    #[error("stake fact has zero amount")]
    ZeroAmount,

    #[error("stake fact has zero timestamp")]
    MissingTimestamp,
}

/// A single credit/debit of linked stake, observed on the foreign-chain
/// staking bridge and keyed by a globally unique event id.
#[derive(
    Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct StakeLinkingFact {
    /// Globally unique event id. No two facts may share one.
    pub id: String,

    /// The party whose stake balance the fact affects.
    pub party: String,

    pub kind: StakeEventKind,

    pub amount: U256,

    /// Foreign-chain event time, unix seconds.
    pub timestamp: i64,

    /// Foreign-chain block the log was found in.
    pub block_height: u64,

    /// Position of the log within the block.
    pub log_index: u32,

    pub tx_hash: Buf32,

    pub status: StakeStatus,

    /// Local time the fact left `Pending`, zero while pending.
    pub finalized_at: i64,
}

impl StakeLinkingFact {
    /// Validates the shape of the fact.
    pub fn validate(&self) -> Result<(), InvalidStakeFact> {
        if self.id.is_empty() {
            return Err(InvalidStakeFact::MissingId);
        }
        if self.party.is_empty() {
            return Err(InvalidStakeFact::MissingParty);
        }
        if self.amount.is_zero() {
            return Err(InvalidStakeFact::ZeroAmount);
        }
        if self.timestamp == 0 {
            return Err(InvalidStakeFact::MissingTimestamp);
        }
        Ok(())
    }

    /// Content hash over the discriminating on-chain fields. The event
    /// id is deliberately excluded so a resubmission of the same fact
    /// under a fresh id still dedups.
    pub fn content_hash(&self) -> Buf32 {
        hash::sha256_borsh(&(
            &self.party,
            self.kind,
            self.amount,
            self.block_height,
            self.log_index,
            self.tx_hash,
        ))
    }

    /// Ordering key for ledger replay: by timestamp, deposits before
    /// removals at the same timestamp so a same-block
    /// deposit-then-withdraw nets correctly.
    pub fn replay_key(&self) -> (i64, StakeEventKind) {
        (self.timestamp, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact() -> StakeLinkingFact {
        StakeLinkingFact {
            id: "ev-1".into(),
            party: "party-1".into(),
            kind: StakeEventKind::Deposited,
            amount: U256::from(10u64),
            timestamp: 100,
            block_height: 5,
            log_index: 0,
            tx_hash: Buf32::from([1; 32]),
            status: StakeStatus::Pending,
            finalized_at: 0,
        }
    }

    #[test]
    fn test_validate_rejects_malformed() {
        let mut f = fact();
        f.id.clear();
        assert_eq!(f.validate(), Err(InvalidStakeFact::MissingId));

        let mut f = fact();
        f.amount = U256::ZERO;
        assert_eq!(f.validate(), Err(InvalidStakeFact::ZeroAmount));

        let mut f = fact();
        f.timestamp = 0;
        assert_eq!(f.validate(), Err(InvalidStakeFact::MissingTimestamp));

        assert!(fact().validate().is_ok());
    }

    #[test]
    fn test_content_hash_discriminates() {
        let a = fact();
        let mut b = fact();
        assert_eq!(a.content_hash(), b.content_hash());
        b.log_index = 1;
        assert_ne!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_content_hash_ignores_event_id() {
        let a = fact();
        let mut b = fact();
        b.id = "resubmitted".to_owned();
        assert_eq!(a.content_hash(), b.content_hash());
    }

    #[test]
    fn test_replay_key_orders_deposit_first() {
        let dep = fact();
        let mut rem = fact();
        rem.kind = StakeEventKind::Removed;
        assert!(dep.replay_key() < rem.replay_key());
    }
}
