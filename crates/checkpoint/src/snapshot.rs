//! Per-component snapshot interface for state sync.
//!
//! Distinct from the checkpoint blob: state sync pulls individual keyed
//! payloads per namespace. `get_state` must be a pure function of
//! in-memory state so repeated calls yield identical bytes.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unknown snapshot key {0}")]
    UnknownKey(String),

    #[error("malformed snapshot payload: {0}")]
    MalformedPayload(String),
}

/// A stateful component exposed to the snapshot layer.
pub trait StateProvider {
    /// Namespace the component's keys live under.
    fn namespace(&self) -> &'static str;

    /// The keys this component serializes.
    fn keys(&self) -> Vec<String>;

    /// Serializes the state under one key. Idempotent and repeatable.
    fn get_state(&self, key: &str) -> Result<Vec<u8>, SnapshotError>;

    /// Restores the state under one key from a payload previously
    /// produced by `get_state`.
    fn load_state(&mut self, key: &str, payload: &[u8]) -> Result<(), SnapshotError>;
}
