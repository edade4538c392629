//! Seams to the validator set and the network layer.

use trestle_bridge_types::NodeSignature;

/// View of the current consensus validator set. Only signatures from
/// current validators count towards quorum.
pub trait ValidatorTopology: Send + Sync {
    /// Whether the node key belongs to a current validator.
    fn is_validator(&self, node: &str) -> bool;

    /// Size of the current validator set.
    fn total_validators(&self) -> usize;

    /// This node's own id.
    fn self_node_id(&self) -> &str;

    /// Whether this node is itself a validator.
    fn is_validator_node(&self) -> bool {
        self.is_validator(self.self_node_id())
    }
}

/// Outbound path for this node's own signatures. Fire-and-forget; the
/// notary retries until the signature comes back through consensus.
pub trait SignatureBroadcaster: Send + Sync {
    fn broadcast(&self, sig: NodeSignature);
}
