//! Verification error types.

use thiserror::Error;
use trestle_evmio::EvmError;

pub type VerificationResult<T> = Result<T, VerificationError>;

#[derive(Debug, Error)]
pub enum VerificationError {
    /// No matching stake deposited log at the claimed position.
    #[error("no stake deposited event found")]
    NoStakeDepositedEventFound,

    /// No matching stake removed log at the claimed position.
    #[error("no stake removed event found")]
    NoStakeRemovedEventFound,

    /// No matching signer added/removed log at the claimed position.
    #[error("no signer event found")]
    NoSignerEventFound,

    /// No matching threshold set log at the claimed position.
    #[error("no threshold set event found")]
    NoThresholdSetEventFound,

    /// The bridge's total staked supply does not match the claim.
    #[error("stake total supply mismatch: expected {expected}, chain has {actual}")]
    TotalSupplyMismatch {
        expected: trestle_primitives::U256,
        actual: trestle_primitives::U256,
    },

    /// Foreign-chain access failed; retryable.
    #[error("foreign chain: {0}")]
    Client(#[from] EvmError),
}

impl VerificationError {
    /// Whether a retry of the same verification can change the outcome.
    ///
    /// A definitive "no such log" is permanent: the query was answered
    /// and the claimed event is not there. Transport failures and
    /// missing confirmation depth are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Client(e) => e.is_transient(),
            _ => false,
        }
    }
}
