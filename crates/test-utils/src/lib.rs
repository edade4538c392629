//! Shared test fixtures: an in-memory foreign chain, a recording
//! broker, and fact builders.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use trestle_bridge_types::{
    BridgeEvent, Broker, SignerEventKind, SignerFact, StakeEventKind, StakeLinkingFact,
    StakeStatus, ThresholdFact,
};
use trestle_evmio::{BlockHeader, BridgeLog, BridgeLogEvent, EvmClient, EvmError, EvmResult, LogQuery};
use trestle_primitives::{Buf20, Buf32, U256};

/// In-memory foreign chain: push logs, set the height, optionally fail
/// upcoming calls to exercise retry paths.
#[derive(Debug, Default)]
pub struct MemoryEvmClient {
    inner: Mutex<MemoryChain>,
}

#[derive(Debug, Default)]
struct MemoryChain {
    logs: Vec<BridgeLog>,
    height: u64,
    headers: Vec<BlockHeader>,
    total_supply: U256,
    /// Errors served before any call succeeds again.
    fail_queue: VecDeque<String>,
    /// When set, every call fails until the chain comes back.
    offline: bool,
}

impl MemoryEvmClient {
    pub fn new(height: u64) -> Self {
        Self {
            inner: Mutex::new(MemoryChain {
                height,
                ..Default::default()
            }),
        }
    }

    pub fn push_log(&self, log: BridgeLog) {
        self.inner.lock().logs.push(log);
    }

    pub fn set_height(&self, height: u64) {
        self.inner.lock().height = height;
    }

    pub fn set_total_supply(&self, supply: U256) {
        self.inner.lock().total_supply = supply;
    }

    pub fn push_header(&self, header: BlockHeader) {
        self.inner.lock().headers.push(header);
    }

    /// Makes the next `n` calls fail with a transport error.
    pub fn fail_next(&self, n: usize) {
        let mut inner = self.inner.lock();
        for _ in 0..n {
            inner.fail_queue.push_back("injected failure".to_owned());
        }
    }

    /// Makes every call fail with a transport error until the chain is
    /// brought back online.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().offline = offline;
    }

    fn take_failure(&self) -> Option<EvmError> {
        let mut inner = self.inner.lock();
        if inner.offline {
            return Some(EvmError::transport("chain offline"));
        }
        inner.fail_queue.pop_front().map(EvmError::Transport)
    }
}

#[async_trait]
impl EvmClient for MemoryEvmClient {
    async fn filter_bridge_logs(&self, query: LogQuery) -> EvmResult<Vec<BridgeLog>> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let inner = self.inner.lock();
        Ok(inner
            .logs
            .iter()
            .filter(|l| {
                l.block_number >= query.from_block
                    && l.block_number <= query.to_block
                    && query.addresses.contains(&l.contract)
            })
            .cloned()
            .collect())
    }

    async fn current_height(&self) -> EvmResult<u64> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        Ok(self.inner.lock().height)
    }

    async fn header_by_number(&self, number: u64) -> EvmResult<BlockHeader> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.inner
            .lock()
            .headers
            .iter()
            .find(|h| h.number == number)
            .copied()
            .ok_or(EvmError::MissingBlock(number))
    }

    async fn stake_total_supply(&self) -> EvmResult<U256> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        Ok(self.inner.lock().total_supply)
    }
}

/// Broker capturing every event for assertions.
#[derive(Debug, Default)]
pub struct RecordingBroker {
    events: Mutex<Vec<BridgeEvent>>,
}

impl RecordingBroker {
    pub fn events(&self) -> Vec<BridgeEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl Broker for RecordingBroker {
    fn send(&self, event: BridgeEvent) {
        self.events.lock().push(event);
    }
}

/// Canonical test addresses.
pub fn bridge_address() -> Buf20 {
    Buf20::from([0xbb; 20])
}

pub fn control_address() -> Buf20 {
    Buf20::from([0xcc; 20])
}

/// A stake fact plus the on-chain log that backs it.
pub fn stake_fact(id: &str, party: &str, kind: StakeEventKind, amount: u64, ts: i64) -> StakeLinkingFact {
    StakeLinkingFact {
        id: id.to_owned(),
        party: party.to_owned(),
        kind,
        amount: U256::from(amount),
        timestamp: ts,
        block_height: 10,
        log_index: 0,
        tx_hash: Buf32::from([0x11; 32]),
        status: StakeStatus::Pending,
        finalized_at: 0,
    }
}

pub fn stake_log(fact: &StakeLinkingFact) -> BridgeLog {
    let event = match fact.kind {
        StakeEventKind::Deposited => BridgeLogEvent::StakeDeposited {
            party: fact.party.clone(),
            amount: fact.amount,
        },
        StakeEventKind::Removed => BridgeLogEvent::StakeRemoved {
            party: fact.party.clone(),
            amount: fact.amount,
        },
    };
    BridgeLog {
        contract: bridge_address(),
        block_number: fact.block_height,
        log_index: fact.log_index,
        tx_hash: fact.tx_hash,
        event,
    }
}

pub fn signer_fact(id: &str, address: Buf20, kind: SignerEventKind, block_time: i64) -> SignerFact {
    SignerFact {
        id: id.to_owned(),
        address,
        kind,
        block_number: 20,
        log_index: 0,
        tx_hash: Buf32::from([0x22; 32]),
        nonce: U256::from(1u64),
        block_time,
    }
}

pub fn signer_log(fact: &SignerFact) -> BridgeLog {
    let event = match fact.kind {
        SignerEventKind::Added => BridgeLogEvent::SignerAdded {
            signer: fact.address,
            nonce: fact.nonce,
        },
        SignerEventKind::Removed => BridgeLogEvent::SignerRemoved {
            signer: fact.address,
            nonce: fact.nonce,
        },
    };
    BridgeLog {
        contract: control_address(),
        block_number: fact.block_number,
        log_index: fact.log_index,
        tx_hash: fact.tx_hash,
        event,
    }
}

pub fn threshold_fact(id: &str, threshold: u16, block_time: i64) -> ThresholdFact {
    ThresholdFact {
        id: id.to_owned(),
        threshold,
        block_number: 21,
        log_index: 0,
        tx_hash: Buf32::from([0x33; 32]),
        nonce: U256::from(2u64),
        block_time,
    }
}

pub fn threshold_log(fact: &ThresholdFact) -> BridgeLog {
    BridgeLog {
        contract: control_address(),
        block_number: fact.block_number,
        log_index: fact.log_index,
        tx_hash: fact.tx_hash,
        event: BridgeLogEvent::ThresholdSet {
            threshold: fact.threshold,
            nonce: fact.nonce,
        },
    }
}
