//! Domain events fanned out to read-only observers via the broker.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::{
    multisig::{SignerFact, ThresholdFact},
    signature::{NodeSignature, SignatureKind},
    stake::StakeLinkingFact,
};

/// Resolution carried by signer/threshold events once witnessed.
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    BorshSerialize,
    BorshDeserialize,
    Serialize,
    Deserialize,
)]
pub enum Resolution {
    Pending,
    Accepted,
    Rejected,
}

/// Events emitted by the core onto the broker. Fire-and-forget,
/// at-least-once to in-process subscribers; never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BridgeEvent {
    /// A stake linking fact changed status (including the initial
    /// `Pending` emission when it is first queued).
    StakeLinking(StakeLinkingFact),

    /// A signer event was queued or resolved.
    Signer {
        fact: SignerFact,
        resolution: Resolution,
    },

    /// A threshold event was queued or resolved.
    Threshold {
        fact: ThresholdFact,
        resolution: Resolution,
    },

    /// A signature aggregate reached quorum.
    SignatureAggregate {
        resource_id: String,
        kind: SignatureKind,
        signatures: Vec<NodeSignature>,
    },
}
