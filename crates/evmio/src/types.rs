//! Typed view of the bridge contract logs.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use trestle_primitives::{Buf20, Buf32, U256};

/// Minimal header view, enough to timestamp events.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    /// Block time, unix seconds.
    pub time: i64,
}

/// A log filter query. Block bounds are inclusive.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LogQuery {
    pub from_block: u64,
    pub to_block: u64,
    /// Contract addresses to match; empty matches nothing.
    pub addresses: Vec<Buf20>,
}

impl LogQuery {
    /// Query scoped to a single block, as used by the on-chain
    /// verifiers.
    pub fn at_block(block: u64, addresses: Vec<Buf20>) -> Self {
        Self {
            from_block: block,
            to_block: block,
            addresses,
        }
    }
}

/// The decoded payload of a bridge contract log.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub enum BridgeLogEvent {
    StakeDeposited { party: String, amount: U256 },
    StakeRemoved { party: String, amount: U256 },
    SignerAdded { signer: Buf20, nonce: U256 },
    SignerRemoved { signer: Buf20, nonce: U256 },
    ThresholdSet { threshold: u16, nonce: U256 },
}

/// A decoded log together with its position on the foreign chain.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct BridgeLog {
    /// Contract that emitted the log.
    pub contract: Buf20,

    pub block_number: u64,

    pub log_index: u32,

    pub tx_hash: Buf32,

    pub event: BridgeLogEvent,
}

impl BridgeLog {
    /// Whether the log sits at exactly the claimed position.
    pub fn at_position(&self, block_number: u64, log_index: u32, tx_hash: &Buf32) -> bool {
        self.block_number == block_number
            && self.log_index == log_index
            && self.tx_hash == *tx_hash
    }
}
