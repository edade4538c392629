//! Deterministic checkpointing of the attestation core.
//!
//! A checkpoint is a hash-addressed snapshot of every registered
//! component's state, serialized in one fixed order so that the bytes,
//! and therefore the hash, are reproducible on every replica. Restores
//! are all-or-nothing and gated on a trusted hash supplied at genesis.

pub mod component;
pub mod engine;
pub mod errors;
pub mod genesis;
pub mod snapshot;
pub mod types;

pub use component::{Component, ComponentName, LoadContext, CHECKPOINT_ORDER};
pub use engine::CheckpointEngine;
pub use errors::{CheckpointError, CheckpointResult};
pub use genesis::{GenesisRestore, GenesisRestoreError};
pub use snapshot::{SnapshotError, StateProvider};
pub use types::Checkpoint;
