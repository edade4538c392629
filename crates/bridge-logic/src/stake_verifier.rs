//! Stake event verifier.
//!
//! Claims enter as `Pending`, get witnessed off-path, and are applied
//! to the event ledger on the tick following their resolution. All
//! state mutation happens on the tick path.

use std::{collections::HashSet, sync::Arc, time::Duration};

use borsh::{BorshDeserialize, BorshSerialize};
use tracing::*;
use trestle_bridge_types::{BridgeEvent, Broker, StakeLinkingFact, StakeStatus};
use trestle_checkpoint::{
    Component, ComponentName, LoadContext, SnapshotError, StateProvider,
};
use trestle_ledger::{EventLedger, LedgerError};
use trestle_primitives::{Buf32, U256};
use trestle_witness::WitnessCoordinator;

use crate::{
    claims::StakePending,
    errors::{VerifierError, VerifierResult},
    factory::CheckFactory,
};

const SNAPSHOT_KEY: &str = "intake";

/// Verifies claimed stake events against the foreign chain and credits
/// or debits the ledger once a claim is witnessed.
pub struct StakeVerifier {
    witness: WitnessCoordinator,
    factory: CheckFactory,
    ledger: Arc<EventLedger>,
    broker: Arc<dyn Broker>,

    /// Window a witness check may stay unresolved before rejection.
    check_timeout: Duration,

    /// Every claim id ever seen. Never evicted.
    ids: HashSet<String>,
    /// Every claim content hash ever seen. Never evicted.
    hashes: HashSet<Buf32>,

    pending: Vec<StakePending>,
    /// Resolved claims awaiting application on the tick path.
    finalized: Vec<(StakePending, bool)>,
}

impl std::fmt::Debug for StakeVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StakeVerifier")
            .field("pending", &self.pending.len())
            .field("seen", &self.ids.len())
            .finish_non_exhaustive()
    }
}

impl StakeVerifier {
    pub fn new(
        witness: WitnessCoordinator,
        factory: CheckFactory,
        ledger: Arc<EventLedger>,
        broker: Arc<dyn Broker>,
        check_timeout: Duration,
    ) -> Self {
        Self {
            witness,
            factory,
            ledger,
            broker,
            check_timeout,
            ids: HashSet::new(),
            hashes: HashSet::new(),
            pending: Vec::new(),
            finalized: Vec::new(),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Queues a claimed stake deposit for witnessing.
    pub fn process_stake_deposited(&mut self, fact: StakeLinkingFact) -> VerifierResult<()> {
        self.queue_claim(StakePending::Linking(fact))
    }

    /// Queues a claimed stake removal for witnessing.
    pub fn process_stake_removed(&mut self, fact: StakeLinkingFact) -> VerifierResult<()> {
        self.queue_claim(StakePending::Linking(fact))
    }

    /// Queues a watch that the bridge's total staked supply currently
    /// equals `expected`.
    pub fn watch_total_supply(&mut self, id: &str, expected: U256) -> VerifierResult<()> {
        self.queue_claim(StakePending::TotalSupply {
            id: id.to_owned(),
            expected,
        })
    }

    /// Queues a watch that the foreign chain reaches `block`.
    pub fn watch_heartbeat(&mut self, id: &str, block: u64) -> VerifierResult<()> {
        self.queue_claim(StakePending::Heartbeat {
            id: id.to_owned(),
            block,
        })
    }

    fn queue_claim(&mut self, claim: StakePending) -> VerifierResult<()> {
        let hash = claim.content_hash();
        if self.ids.contains(claim.id()) || self.hashes.contains(&hash) {
            return Err(VerifierError::DuplicatedStakeEvent(claim.id().to_owned()));
        }
        self.ids.insert(claim.id().to_owned());
        self.hashes.insert(hash);

        let check = self.factory.stake_check(&claim);
        self.witness
            .start_check(claim.id(), self.check_timeout, check)?;

        if let StakePending::Linking(fact) = &claim {
            // Observers see the claim queued before any witness lands.
            self.broker.send(BridgeEvent::StakeLinking(fact.clone()));
        }
        debug!(id = %claim.id(), "stake claim queued");
        self.pending.push(claim);
        Ok(())
    }

    /// Drains witness resolutions and applies them. Tick path only.
    pub fn on_tick(&mut self, t: i64) {
        for (id, ok) in self.witness.drain_resolved() {
            let Some(pos) = self.pending.iter().position(|c| c.id() == id) else {
                error!(%id, "resolved stake claim not in pending queue");
                continue;
            };
            let claim = self.pending.remove(pos);
            self.finalized.push((claim, ok));
        }

        for (claim, ok) in std::mem::take(&mut self.finalized) {
            self.apply(claim, ok, t);
        }
    }

    fn apply(&mut self, claim: StakePending, ok: bool, t: i64) {
        match claim {
            StakePending::Linking(mut fact) => {
                fact.status = if ok {
                    StakeStatus::Accepted
                } else {
                    StakeStatus::Rejected
                };
                fact.finalized_at = t;
                self.broker.send(BridgeEvent::StakeLinking(fact.clone()));
                if !ok {
                    info!(id = %fact.id, party = %fact.party, "stake claim rejected");
                    return;
                }
                let party = fact.party.clone();
                match self.ledger.add_event(&party, fact) {
                    Ok(()) => {}
                    // The fact is stored and the balance holds; a later
                    // reordering correction can still resolve it.
                    Err(LedgerError::NegativeBalance(party)) => {
                        warn!(%party, "accepted stake removal exceeds balance");
                    }
                    Err(e) => error!(%party, err = %e, "ledger rejected witnessed fact"),
                }
            }
            StakePending::TotalSupply { id, expected } => {
                if ok {
                    debug!(%id, %expected, "total supply watch confirmed");
                } else {
                    warn!(%id, %expected, "total supply watch failed");
                }
            }
            StakePending::Heartbeat { id, block } => {
                if ok {
                    debug!(%id, %block, "heartbeat watch confirmed");
                } else {
                    warn!(%id, %block, "heartbeat watch expired");
                }
            }
        }
    }

    /// The lowest foreign-chain block any unresolved or unapplied claim
    /// references. Polling resumed from here re-observes nothing that
    /// was already applied but skips no claim still in flight.
    pub fn last_block_seen(&self) -> Option<u64> {
        self.pending
            .iter()
            .filter_map(|c| c.block())
            .chain(self.finalized.iter().filter_map(|(c, _)| c.block()))
            .min()
    }

    fn snapshot_payload(&self) -> StakeVerifierSnapshot {
        StakeVerifierSnapshot {
            ids: self.ids.iter().cloned().collect(),
            hashes: self.hashes.iter().copied().collect(),
            pending: self.pending.clone(),
        }
    }

    fn restore_payload(&mut self, snapshot: StakeVerifierSnapshot) -> Result<(), SnapshotError> {
        self.ids = snapshot.ids.into_iter().collect();
        self.hashes = snapshot.hashes.into_iter().collect();
        self.pending.clear();
        self.finalized.clear();
        // Restored claims get a fresh verification window.
        for claim in snapshot.pending {
            let check = self.factory.stake_check(&claim);
            self.witness
                .restore_check(claim.id(), self.check_timeout, check)
                .map_err(|e| SnapshotError::MalformedPayload(e.to_string()))?;
            self.pending.push(claim);
        }
        Ok(())
    }
}

/// Persisted verifier state. Sets are sorted on write so the payload
/// is a pure function of the logical state.
#[derive(BorshSerialize, BorshDeserialize)]
struct StakeVerifierSnapshot {
    ids: Vec<String>,
    hashes: Vec<Buf32>,
    pending: Vec<StakePending>,
}

impl StateProvider for StakeVerifier {
    fn namespace(&self) -> &'static str {
        "banking"
    }

    fn keys(&self) -> Vec<String> {
        vec![SNAPSHOT_KEY.to_owned()]
    }

    fn get_state(&self, key: &str) -> Result<Vec<u8>, SnapshotError> {
        if key != SNAPSHOT_KEY {
            return Err(SnapshotError::UnknownKey(key.to_owned()));
        }
        let mut payload = self.snapshot_payload();
        payload.ids.sort();
        payload.hashes.sort();
        borsh::to_vec(&payload).map_err(|e| SnapshotError::MalformedPayload(e.to_string()))
    }

    fn load_state(&mut self, key: &str, payload: &[u8]) -> Result<(), SnapshotError> {
        if key != SNAPSHOT_KEY {
            return Err(SnapshotError::UnknownKey(key.to_owned()));
        }
        let snapshot: StakeVerifierSnapshot = borsh::from_slice(payload)
            .map_err(|e| SnapshotError::MalformedPayload(e.to_string()))?;
        self.restore_payload(snapshot)
    }
}

impl Component for StakeVerifier {
    fn name(&self) -> ComponentName {
        ComponentName::Banking
    }

    fn serialize(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.get_state(SNAPSHOT_KEY)?)
    }

    fn load(&mut self, data: &[u8], _ctx: &mut LoadContext) -> anyhow::Result<()> {
        self.load_state(SNAPSHOT_KEY, data)?;
        Ok(())
    }
}
