//! The notary engine.

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use borsh::{BorshDeserialize, BorshSerialize};
use thiserror::Error;
use tracing::*;
use trestle_bridge_types::{Broker, BridgeEvent, NodeSignature, SignatureKind};
use trestle_checkpoint::{SnapshotError, StateProvider};

use crate::{
    tracker::TxTracker,
    traits::{SignatureBroadcaster, ValidatorTopology},
};

const SNAPSHOT_KEY: &str = "aggregates";

type Key = (String, SignatureKind);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotaryError {
    /// No aggregate is open for the resource.
    #[error("unknown resource id {0}")]
    UnknownResourceId(String),

    /// The signing node is not a current validator.
    #[error("not a validator signature: {0}")]
    NotAValidatorSignature(String),
}

/// Notary configuration.
#[derive(Debug, Clone)]
pub struct NotaryConfig {
    /// Fraction of the validator set that must sign, in `(0, 1]`.
    /// Defaults to unanimity.
    pub votes_required: f64,

    /// Seconds between resends of our own unacknowledged signature.
    pub retry_interval: i64,
}

impl Default for NotaryConfig {
    fn default() -> Self {
        Self {
            votes_required: 1.0,
            retry_interval: 30,
        }
    }
}

/// Aggregates validator signatures per `(resource id, kind)` and
/// certifies quorum.
pub struct Notary {
    config: NotaryConfig,
    topology: Arc<dyn ValidatorTopology>,
    broadcaster: Arc<dyn SignatureBroadcaster>,
    broker: Arc<dyn Broker>,

    /// Signature sets per aggregate, one signature per node. Retained
    /// after quorum for snapshotting.
    sigs: BTreeMap<Key, BTreeMap<String, Vec<u8>>>,

    /// Aggregates that have not reached quorum yet.
    pending: BTreeSet<Key>,

    retries: TxTracker,
}

impl std::fmt::Debug for Notary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notary")
            .field("aggregates", &self.sigs.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl Notary {
    pub fn new(
        config: NotaryConfig,
        topology: Arc<dyn ValidatorTopology>,
        broadcaster: Arc<dyn SignatureBroadcaster>,
        broker: Arc<dyn Broker>,
    ) -> Self {
        Self {
            config,
            topology,
            broadcaster,
            broker,
            sigs: BTreeMap::new(),
            pending: BTreeSet::new(),
            retries: TxTracker::default(),
        }
    }

    /// Opens a new aggregate for the resource and queues our own
    /// signature for broadcast if this node validates.
    ///
    /// # Panics
    ///
    /// Panics if an aggregate already exists for `(resource_id, kind)`.
    /// That can only happen through a caller bug, and continuing would
    /// desynchronize this replica from the network.
    pub fn start_aggregate(
        &mut self,
        resource_id: &str,
        kind: SignatureKind,
        own_signature: NodeSignature,
    ) {
        let key = (resource_id.to_owned(), kind);
        if self.sigs.contains_key(&key) {
            error!(%resource_id, ?kind, "duplicate signature aggregate");
            panic!("notary: aggregate for {resource_id:?}/{kind:?} started twice");
        }
        debug!(%resource_id, ?kind, "starting signature aggregate");
        self.sigs.insert(key.clone(), BTreeMap::new());
        self.pending.insert(key);

        if self.topology.is_validator_node() {
            self.retries.track(own_signature);
        }
    }

    /// Records a validator's signature for an open aggregate and
    /// re-evaluates quorum.
    pub fn register_signature(
        &mut self,
        node: &str,
        sig: NodeSignature,
    ) -> Result<(), NotaryError> {
        let key = sig.key();
        if !self.sigs.contains_key(&key) {
            return Err(NotaryError::UnknownResourceId(sig.resource_id));
        }
        if !self.topology.is_validator(node) {
            return Err(NotaryError::NotAValidatorSignature(node.to_owned()));
        }

        if node == self.topology.self_node_id() {
            // Our own signature made it through consensus, stop
            // resending it.
            self.retries.clear(&key);
        }

        let set = self.sigs.get_mut(&key).expect("notary: checked above");
        set.insert(node.to_owned(), sig.sig);
        self.evaluate_quorum(&key);
        Ok(())
    }

    /// Tick driver: re-evaluates quorum for every pending aggregate
    /// (the validator set may have changed) and resends due own
    /// signatures.
    pub fn on_tick(&mut self, t: i64) {
        let pending: Vec<Key> = self.pending.iter().cloned().collect();
        for key in pending {
            self.evaluate_quorum(&key);
        }
        for sig in self.retries.due(t, self.config.retry_interval) {
            trace!(resource_id = %sig.resource_id, "resending own signature");
            self.broadcaster.broadcast(sig);
        }
    }

    /// Whether the aggregate is still short of quorum.
    pub fn is_pending(&self, resource_id: &str, kind: SignatureKind) -> bool {
        self.pending.contains(&(resource_id.to_owned(), kind))
    }

    /// Signatures recorded so far for an aggregate.
    pub fn signatures(&self, resource_id: &str, kind: SignatureKind) -> Vec<NodeSignature> {
        let key = (resource_id.to_owned(), kind);
        self.collect_signatures(&key)
    }

    fn collect_signatures(&self, key: &Key) -> Vec<NodeSignature> {
        self.sigs
            .get(key)
            .map(|set| {
                set.iter()
                    .map(|(node, sig)| {
                        NodeSignature::new(node.clone(), sig.clone(), key.0.clone(), key.1)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn evaluate_quorum(&mut self, key: &Key) {
        if !self.pending.contains(key) {
            return;
        }
        let Some(set) = self.sigs.get(key) else {
            return;
        };
        let total = self.topology.total_validators();
        if total == 0 {
            return;
        }
        // Only current validators count; the set membership may have
        // changed since a signature was recorded.
        let count = set
            .keys()
            .filter(|node| self.topology.is_validator(node))
            .count();
        if (count as f64) / (total as f64) >= self.config.votes_required {
            info!(
                resource_id = %key.0,
                kind = ?key.1,
                %count,
                %total,
                "signature aggregate reached quorum"
            );
            self.pending.remove(key);
            self.broker.send(BridgeEvent::SignatureAggregate {
                resource_id: key.0.clone(),
                kind: key.1,
                signatures: self.collect_signatures(key),
            });
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize)]
struct AggregateState {
    resource_id: String,
    kind: SignatureKind,
    pending: bool,
    sigs: Vec<(String, Vec<u8>)>,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct NotarySnapshot {
    aggregates: Vec<AggregateState>,
    /// Own signatures still awaiting acknowledgement. Restored with
    /// zeroed send times so they fire immediately after a restart.
    own_retries: Vec<NodeSignature>,
}

impl StateProvider for Notary {
    fn namespace(&self) -> &'static str {
        "notary"
    }

    fn keys(&self) -> Vec<String> {
        vec![SNAPSHOT_KEY.to_owned()]
    }

    fn get_state(&self, key: &str) -> Result<Vec<u8>, SnapshotError> {
        if key != SNAPSHOT_KEY {
            return Err(SnapshotError::UnknownKey(key.to_owned()));
        }
        let snapshot = NotarySnapshot {
            aggregates: self
                .sigs
                .iter()
                .map(|(k, set)| AggregateState {
                    resource_id: k.0.clone(),
                    kind: k.1,
                    pending: self.pending.contains(k),
                    sigs: set.iter().map(|(n, s)| (n.clone(), s.clone())).collect(),
                })
                .collect(),
            own_retries: self.retries.entries().map(|e| e.sig.clone()).collect(),
        };
        borsh::to_vec(&snapshot).map_err(|e| SnapshotError::MalformedPayload(e.to_string()))
    }

    fn load_state(&mut self, key: &str, payload: &[u8]) -> Result<(), SnapshotError> {
        if key != SNAPSHOT_KEY {
            return Err(SnapshotError::UnknownKey(key.to_owned()));
        }
        let snapshot: NotarySnapshot = borsh::from_slice(payload)
            .map_err(|e| SnapshotError::MalformedPayload(e.to_string()))?;

        self.sigs.clear();
        self.pending.clear();
        self.retries = TxTracker::default();
        for agg in snapshot.aggregates {
            let key = (agg.resource_id, agg.kind);
            if agg.pending {
                self.pending.insert(key.clone());
            }
            self.sigs.insert(key, agg.sigs.into_iter().collect());
        }
        for sig in snapshot.own_retries {
            self.retries.track(sig);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use parking_lot::Mutex;

    use super::*;

    struct FixedTopology {
        validators: BTreeSet<String>,
        self_id: String,
    }

    impl FixedTopology {
        fn new(validators: &[&str], self_id: &str) -> Arc<Self> {
            Arc::new(Self {
                validators: validators.iter().map(|s| s.to_string()).collect(),
                self_id: self_id.to_owned(),
            })
        }
    }

    impl ValidatorTopology for FixedTopology {
        fn is_validator(&self, node: &str) -> bool {
            self.validators.contains(node)
        }

        fn total_validators(&self) -> usize {
            self.validators.len()
        }

        fn self_node_id(&self) -> &str {
            &self.self_id
        }
    }

    #[derive(Default)]
    struct RecordingBroadcaster {
        sent: Mutex<Vec<NodeSignature>>,
    }

    impl SignatureBroadcaster for RecordingBroadcaster {
        fn broadcast(&self, sig: NodeSignature) {
            self.sent.lock().push(sig);
        }
    }

    #[derive(Default)]
    struct RecordingBroker {
        events: Mutex<Vec<BridgeEvent>>,
    }

    impl Broker for RecordingBroker {
        fn send(&self, event: BridgeEvent) {
            self.events.lock().push(event);
        }
    }

    fn sig(node: &str, id: &str) -> NodeSignature {
        NodeSignature::new(node, vec![0xab], id, SignatureKind::Withdrawal)
    }

    fn notary(
        validators: &[&str],
        self_id: &str,
        votes_required: f64,
    ) -> (Notary, Arc<RecordingBroadcaster>, Arc<RecordingBroker>) {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let broker = Arc::new(RecordingBroker::default());
        let n = Notary::new(
            NotaryConfig {
                votes_required,
                retry_interval: 30,
            },
            FixedTopology::new(validators, self_id),
            broadcaster.clone(),
            broker.clone(),
        );
        (n, broadcaster, broker)
    }

    #[test]
    fn test_single_validator_unanimous() {
        let (mut n, _, broker) = notary(&["v1"], "v1", 1.0);
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("v1", "w1"));
        assert!(n.is_pending("w1", SignatureKind::Withdrawal));

        n.register_signature("v1", sig("v1", "w1")).unwrap();
        assert!(!n.is_pending("w1", SignatureKind::Withdrawal));
        assert_eq!(broker.events.lock().len(), 1);
    }

    #[test]
    fn test_quorum_arithmetic_three_validators() {
        // 2 of 3 does not reach unanimity.
        let (mut n, _, broker) = notary(&["v1", "v2", "v3"], "v1", 1.0);
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("v1", "w1"));
        n.register_signature("v1", sig("v1", "w1")).unwrap();
        n.register_signature("v2", sig("v2", "w1")).unwrap();
        assert!(n.is_pending("w1", SignatureKind::Withdrawal));
        assert!(broker.events.lock().is_empty());

        // But does reach a 0.66 threshold.
        let (mut n, _, broker) = notary(&["v1", "v2", "v3"], "v1", 0.66);
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("v1", "w1"));
        n.register_signature("v1", sig("v1", "w1")).unwrap();
        n.register_signature("v2", sig("v2", "w1")).unwrap();
        assert!(!n.is_pending("w1", SignatureKind::Withdrawal));
        let events = broker.events.lock();
        let BridgeEvent::SignatureAggregate { signatures, .. } = &events[0] else {
            panic!("expected aggregate event");
        };
        assert_eq!(signatures.len(), 2);
    }

    #[test]
    fn test_unknown_resource_rejected() {
        let (mut n, _, _) = notary(&["v1"], "v1", 1.0);
        let err = n.register_signature("v1", sig("v1", "nope")).unwrap_err();
        assert_eq!(err, NotaryError::UnknownResourceId("nope".to_owned()));
    }

    #[test]
    fn test_non_validator_rejected() {
        let (mut n, _, _) = notary(&["v1"], "v1", 1.0);
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("v1", "w1"));
        let err = n
            .register_signature("outsider", sig("outsider", "w1"))
            .unwrap_err();
        assert_eq!(
            err,
            NotaryError::NotAValidatorSignature("outsider".to_owned())
        );
    }

    #[test]
    #[should_panic(expected = "started twice")]
    fn test_duplicate_aggregate_panics() {
        let (mut n, _, _) = notary(&["v1"], "v1", 1.0);
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("v1", "w1"));
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("v1", "w1"));
    }

    #[test]
    fn test_own_signature_retry_and_clear() {
        let (mut n, broadcaster, _) = notary(&["v1", "v2"], "v1", 1.0);
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("v1", "w1"));

        // Never sent: fires on the first tick.
        n.on_tick(100);
        assert_eq!(broadcaster.sent.lock().len(), 1);
        // Within the interval: nothing.
        n.on_tick(110);
        assert_eq!(broadcaster.sent.lock().len(), 1);
        // Past the interval: resent.
        n.on_tick(130);
        assert_eq!(broadcaster.sent.lock().len(), 2);

        // Own signature lands through consensus; resends stop.
        n.register_signature("v1", sig("v1", "w1")).unwrap();
        n.on_tick(1000);
        assert_eq!(broadcaster.sent.lock().len(), 2);
    }

    #[test]
    fn test_non_validator_node_does_not_broadcast() {
        let (mut n, broadcaster, _) = notary(&["v1"], "observer", 1.0);
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("observer", "w1"));
        n.on_tick(100);
        assert!(broadcaster.sent.lock().is_empty());
    }

    #[test]
    fn test_quorum_reached_on_tick_after_set_change() {
        // Same signature set, but quorum only computes on tick once a
        // fraction threshold is in play.
        let (mut n, _, broker) = notary(&["v1", "v2", "v3"], "v1", 0.5);
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("v1", "w1"));
        n.register_signature("v1", sig("v1", "w1")).unwrap();
        n.register_signature("v2", sig("v2", "w1")).unwrap();
        // 2/3 >= 0.5 already certified on insert.
        assert_eq!(broker.events.lock().len(), 1);
        // Ticks never re-certify a closed aggregate.
        n.on_tick(10);
        assert_eq!(broker.events.lock().len(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let (mut n, _, _) = notary(&["v1", "v2"], "v1", 1.0);
        n.start_aggregate("w1", SignatureKind::Withdrawal, sig("v1", "w1"));
        n.register_signature("v2", sig("v2", "w1")).unwrap();

        let state = n.get_state(SNAPSHOT_KEY).unwrap();
        let (mut restored, broadcaster, _) = notary(&["v1", "v2"], "v1", 1.0);
        restored.load_state(SNAPSHOT_KEY, &state).unwrap();

        // Identical bytes after a round trip.
        assert_eq!(restored.get_state(SNAPSHOT_KEY).unwrap(), state);
        // Still pending, still one signature recorded.
        assert!(restored.is_pending("w1", SignatureKind::Withdrawal));
        assert_eq!(
            restored.signatures("w1", SignatureKind::Withdrawal).len(),
            1
        );
        // Retry entries restored as never-sent: immediate resend.
        restored.on_tick(5);
        assert_eq!(broadcaster.sent.lock().len(), 1);

        // Our own signature completes the aggregate post-restore.
        restored.register_signature("v1", sig("v1", "w1")).unwrap();
        assert!(!restored.is_pending("w1", SignatureKind::Withdrawal));
    }
}
