//! Ledger error types.

use thiserror::Error;
use trestle_bridge_types::stake::InvalidStakeFact;

pub type LedgerResult<T> = Result<T, LedgerError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("invalid stake fact: {0}")]
    InvalidFact(#[from] InvalidStakeFact),

    /// The fact names a different party than the entry it was submitted
    /// under.
    #[error("party mismatch: expected {expected}, fact names {got}")]
    PartyMismatch { expected: String, got: String },

    /// A fact with this id is already in the ledger.
    #[error("duplicate stake event {0}")]
    DuplicateEvent(String),

    /// Replaying the facts drove the balance below zero. The offending
    /// fact stays stored and the balance holds at its pre-negative
    /// value; a later correction (an out-of-order deposit arriving)
    /// re-derives a valid sequence.
    #[error("negative balance for party {0}")]
    NegativeBalance(String),
}
