//! Error types for foreign-chain access.

use thiserror::Error;

pub type EvmResult<T> = Result<T, EvmError>;

#[derive(Debug, Error)]
pub enum EvmError {
    /// Transport-level failure reaching the foreign chain. Always
    /// transient: callers retry with constant backoff, forever if need
    /// be.
    #[error("foreign chain transport: {0}")]
    Transport(String),

    /// The queried block does not exist (yet) on the node we talked to.
    #[error("missing block {0}")]
    MissingBlock(u64),

    /// The claimed block is not buried deeply enough.
    #[error("block {block} has {have} confirmations, need {need}")]
    InsufficientConfirmations { block: u64, have: u64, need: u64 },
}

impl EvmError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Whether retrying the same call later can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::MissingBlock(_) | Self::InsufficientConfirmations { .. }
        )
    }
}
