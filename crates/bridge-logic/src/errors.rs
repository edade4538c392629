//! Domain verifier error types.

use thiserror::Error;
use trestle_witness::WitnessError;

pub type VerifierResult<T> = Result<T, VerifierError>;

#[derive(Debug, Error)]
pub enum VerifierError {
    /// The stake event's id or content hash was seen before.
    #[error("duplicated stake event {0}")]
    DuplicatedStakeEvent(String),

    /// The signer event's id or content hash was seen before.
    #[error("duplicated signer event {0}")]
    DuplicatedSignerEvent(String),

    /// The threshold event's id or content hash was seen before.
    #[error("duplicated threshold event {0}")]
    DuplicatedThresholdEvent(String),

    /// The witness coordinator refused the check registration.
    #[error("witness: {0}")]
    Witness(#[from] WitnessError),
}
