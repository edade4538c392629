//! Multisig signer-set and threshold tracking.
//!
//! Signer and threshold facts go through the same queue-witness-apply
//! cycle as stake claims. Application breaks ties by foreign-chain
//! block time: for any address, the fact with the greatest block time
//! decides membership, regardless of the order resolutions arrive in.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::*;
use trestle_bridge_types::{
    BridgeEvent, Broker, Resolution, SignerEventKind, SignerFact, ThresholdFact,
};
use trestle_checkpoint::{
    Component, ComponentName, LoadContext, SnapshotError, StateProvider,
};
use trestle_primitives::{Buf20, Buf32};
use trestle_witness::WitnessCoordinator;

use crate::{
    claims::ControlPending,
    errors::{VerifierError, VerifierResult},
    factory::CheckFactory,
};

const SNAPSHOT_KEY: &str = "topology";

/// Tracks the witnessed multisig signer set and signature threshold.
pub struct MultisigTopology {
    witness: WitnessCoordinator,
    factory: CheckFactory,
    broker: Arc<dyn Broker>,
    check_timeout: Duration,

    signers: BTreeSet<Buf20>,
    /// Block time and id of the fact that decided each address, so a
    /// stale fact resolving late never overrides a fresher one.
    decided: BTreeMap<Buf20, (i64, String)>,

    /// Threshold in basis points of the signer set.
    threshold: u16,
    threshold_decided: (i64, String),

    /// Every fact id ever seen. Never evicted.
    ids: HashSet<String>,
    /// Every fact content hash ever seen. Never evicted.
    hashes: HashSet<Buf32>,

    pending: Vec<ControlPending>,
    finalized: Vec<(ControlPending, bool)>,
}

impl std::fmt::Debug for MultisigTopology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultisigTopology")
            .field("signers", &self.signers.len())
            .field("threshold", &self.threshold)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl MultisigTopology {
    pub fn new(
        witness: WitnessCoordinator,
        factory: CheckFactory,
        broker: Arc<dyn Broker>,
        check_timeout: Duration,
    ) -> Self {
        Self {
            witness,
            factory,
            broker,
            check_timeout,
            signers: BTreeSet::new(),
            decided: BTreeMap::new(),
            threshold: 0,
            threshold_decided: (0, String::new()),
            ids: HashSet::new(),
            hashes: HashSet::new(),
            pending: Vec::new(),
            finalized: Vec::new(),
        }
    }

    pub fn signers(&self) -> Vec<Buf20> {
        self.signers.iter().copied().collect()
    }

    pub fn is_signer(&self, address: &Buf20) -> bool {
        self.signers.contains(address)
    }

    pub fn threshold(&self) -> u16 {
        self.threshold
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Queues a claimed signer added/removed event for witnessing.
    pub fn process_signer_event(&mut self, fact: SignerFact) -> VerifierResult<()> {
        let claim = ControlPending::Signer(fact);
        if self.seen(&claim) {
            return Err(VerifierError::DuplicatedSignerEvent(claim.id().to_owned()));
        }
        self.queue_claim(claim)
    }

    /// Queues a claimed threshold set event for witnessing.
    pub fn process_threshold_set(&mut self, fact: ThresholdFact) -> VerifierResult<()> {
        let claim = ControlPending::Threshold(fact);
        if self.seen(&claim) {
            return Err(VerifierError::DuplicatedThresholdEvent(
                claim.id().to_owned(),
            ));
        }
        self.queue_claim(claim)
    }

    fn seen(&self, claim: &ControlPending) -> bool {
        self.ids.contains(claim.id()) || self.hashes.contains(&claim.content_hash())
    }

    fn queue_claim(&mut self, claim: ControlPending) -> VerifierResult<()> {
        self.ids.insert(claim.id().to_owned());
        self.hashes.insert(claim.content_hash());

        let check = self.factory.control_check(&claim);
        self.witness
            .start_check(claim.id(), self.check_timeout, check)?;

        self.emit(&claim, Resolution::Pending);
        debug!(id = %claim.id(), "control claim queued");
        self.pending.push(claim);
        Ok(())
    }

    fn emit(&self, claim: &ControlPending, resolution: Resolution) {
        let event = match claim {
            ControlPending::Signer(fact) => BridgeEvent::Signer {
                fact: fact.clone(),
                resolution,
            },
            ControlPending::Threshold(fact) => BridgeEvent::Threshold {
                fact: fact.clone(),
                resolution,
            },
        };
        self.broker.send(event);
    }

    /// Drains witness resolutions and applies accepted facts. Tick
    /// path only.
    pub fn on_tick(&mut self, _t: i64) {
        for (id, ok) in self.witness.drain_resolved() {
            let Some(pos) = self.pending.iter().position(|c| c.id() == id) else {
                error!(%id, "resolved control claim not in pending queue");
                continue;
            };
            let claim = self.pending.remove(pos);
            self.finalized.push((claim, ok));
        }

        let mut accepted: Vec<ControlPending> = Vec::new();
        for (claim, ok) in std::mem::take(&mut self.finalized) {
            let resolution = if ok {
                Resolution::Accepted
            } else {
                Resolution::Rejected
            };
            self.emit(&claim, resolution);
            if ok {
                accepted.push(claim);
            } else {
                info!(id = %claim.id(), "control claim rejected");
            }
        }

        // Apply in ascending block-time order so the freshest fact for
        // an address lands last within this tick; the decided marks
        // extend the same rule across ticks.
        accepted.sort_by(|a, b| decision_key(a).cmp(&decision_key(b)));
        for claim in accepted {
            match claim {
                ControlPending::Signer(fact) => self.apply_signer(fact),
                ControlPending::Threshold(fact) => self.apply_threshold(fact),
            }
        }
    }

    fn apply_signer(&mut self, fact: SignerFact) {
        let mark = (fact.block_time, fact.id.clone());
        if let Some(prev) = self.decided.get(&fact.address) {
            if *prev >= mark {
                debug!(id = %fact.id, address = %fact.address, "stale signer fact ignored");
                return;
            }
        }
        match fact.kind {
            SignerEventKind::Added => {
                self.signers.insert(fact.address);
                info!(address = %fact.address, "signer added");
            }
            SignerEventKind::Removed => {
                self.signers.remove(&fact.address);
                info!(address = %fact.address, "signer removed");
            }
        }
        self.decided.insert(fact.address, mark);
    }

    fn apply_threshold(&mut self, fact: ThresholdFact) {
        let mark = (fact.block_time, fact.id.clone());
        if self.threshold_decided >= mark {
            debug!(id = %fact.id, "stale threshold fact ignored");
            return;
        }
        info!(threshold = %fact.threshold, "threshold replaced");
        self.threshold = fact.threshold;
        self.threshold_decided = mark;
    }

    /// The lowest foreign-chain block any unresolved claim references.
    pub fn last_block_seen(&self) -> Option<u64> {
        self.pending
            .iter()
            .map(|c| c.block())
            .chain(self.finalized.iter().map(|(c, _)| c.block()))
            .min()
    }

    fn snapshot_payload(&self) -> TopologySnapshot {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        let mut hashes: Vec<Buf32> = self.hashes.iter().copied().collect();
        ids.sort();
        hashes.sort();
        TopologySnapshot {
            signers: self.signers.iter().copied().collect(),
            decided: self
                .decided
                .iter()
                .map(|(addr, (t, id))| (*addr, *t, id.clone()))
                .collect(),
            threshold: self.threshold,
            threshold_decided: self.threshold_decided.clone(),
            ids,
            hashes,
            pending: self.pending.clone(),
        }
    }

    fn restore_payload(&mut self, snapshot: TopologySnapshot) -> Result<(), SnapshotError> {
        self.signers = snapshot.signers.into_iter().collect();
        self.decided = snapshot
            .decided
            .into_iter()
            .map(|(addr, t, id)| (addr, (t, id)))
            .collect();
        self.threshold = snapshot.threshold;
        self.threshold_decided = snapshot.threshold_decided;
        self.ids = snapshot.ids.into_iter().collect();
        self.hashes = snapshot.hashes.into_iter().collect();
        self.pending.clear();
        self.finalized.clear();
        // Restored claims get a fresh verification window.
        for claim in snapshot.pending {
            let check = self.factory.control_check(&claim);
            self.witness
                .restore_check(claim.id(), self.check_timeout, check)
                .map_err(|e| SnapshotError::MalformedPayload(e.to_string()))?;
            self.pending.push(claim);
        }
        Ok(())
    }
}

fn decision_key(claim: &ControlPending) -> (i64, &str) {
    match claim {
        ControlPending::Signer(fact) => (fact.block_time, &fact.id),
        ControlPending::Threshold(fact) => (fact.block_time, &fact.id),
    }
}

#[derive(BorshSerialize, BorshDeserialize)]
struct TopologySnapshot {
    signers: Vec<Buf20>,
    decided: Vec<(Buf20, i64, String)>,
    threshold: u16,
    threshold_decided: (i64, String),
    ids: Vec<String>,
    hashes: Vec<Buf32>,
    pending: Vec<ControlPending>,
}

impl StateProvider for MultisigTopology {
    fn namespace(&self) -> &'static str {
        "bridge_control"
    }

    fn keys(&self) -> Vec<String> {
        vec![SNAPSHOT_KEY.to_owned()]
    }

    fn get_state(&self, key: &str) -> Result<Vec<u8>, SnapshotError> {
        if key != SNAPSHOT_KEY {
            return Err(SnapshotError::UnknownKey(key.to_owned()));
        }
        borsh::to_vec(&self.snapshot_payload())
            .map_err(|e| SnapshotError::MalformedPayload(e.to_string()))
    }

    fn load_state(&mut self, key: &str, payload: &[u8]) -> Result<(), SnapshotError> {
        if key != SNAPSHOT_KEY {
            return Err(SnapshotError::UnknownKey(key.to_owned()));
        }
        let snapshot: TopologySnapshot = borsh::from_slice(payload)
            .map_err(|e| SnapshotError::MalformedPayload(e.to_string()))?;
        self.restore_payload(snapshot)
    }
}

impl Component for MultisigTopology {
    fn name(&self) -> ComponentName {
        ComponentName::BridgeControl
    }

    fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.get_state(SNAPSHOT_KEY)?)
    }

    fn load(&mut self, data: &[u8], _ctx: &mut LoadContext) -> anyhow::Result<()> {
        self.load_state(SNAPSHOT_KEY, data)?;
        Ok(())
    }
}
