//! Witness error types.

use thiserror::Error;

/// Outcome classification for a single check attempt.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The check could not be completed; retry later.
    #[error("transient: {0}")]
    Transient(String),

    /// The check completed and the claim is not on the foreign chain.
    /// No retry will change that.
    #[error("failed: {0}")]
    Failed(String),
}

impl CheckError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Errors registering resources with the coordinator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WitnessError {
    /// A check for this resource id is already in flight.
    #[error("duplicate pending resource {0}")]
    DuplicateResource(String),
}
