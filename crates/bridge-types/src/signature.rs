//! Validator signatures over attestable resources.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// What kind of resource a signature attests to. Aggregates are keyed by
/// `(resource id, kind)` so the same id can be certified for different
/// purposes independently.
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
pub enum SignatureKind {
    /// Approval for a withdrawal back onto the foreign chain.
    Withdrawal,
    /// A multisig control operation (signer add/remove, threshold set).
    BridgeControl,
}

/// A single validator's signature over a resource.
///
/// The signature bytes are opaque here; cryptographic verification
/// happens in the ingestion layer before the signature reaches the
/// notary. The notary only checks validator membership and counts.
#[derive(
    Clone, Debug, Eq, PartialEq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct NodeSignature {
    /// Id of the node that produced the signature.
    pub node: String,

    /// Opaque signature bytes.
    pub sig: Vec<u8>,

    /// The resource being attested.
    pub resource_id: String,

    pub kind: SignatureKind,
}

impl NodeSignature {
    pub fn new(node: impl Into<String>, sig: Vec<u8>, resource_id: impl Into<String>, kind: SignatureKind) -> Self {
        Self {
            node: node.into(),
            sig,
            resource_id: resource_id.into(),
            kind,
        }
    }

    /// The aggregate key this signature belongs to.
    pub fn key(&self) -> (String, SignatureKind) {
        (self.resource_id.clone(), self.kind)
    }
}
