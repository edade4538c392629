//! Foreign-chain client trait.

use async_trait::async_trait;

use trestle_primitives::U256;

use crate::{
    error::EvmResult,
    types::{BlockHeader, BridgeLog, LogQuery},
};

/// Read-only access to the foreign chain.
///
/// Implementations may block and retry internally; callers on the
/// witness path already treat every error as retryable. Nothing behind
/// this trait is allowed to touch protocol state.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait EvmClient: Send + Sync {
    /// Runs a log filter query against the bridge contracts.
    async fn filter_bridge_logs(&self, query: LogQuery) -> EvmResult<Vec<BridgeLog>>;

    /// Height of the foreign chain as seen by the connected node.
    async fn current_height(&self) -> EvmResult<u64>;

    /// Header of the given block, for event timestamps.
    async fn header_by_number(&self, number: u64) -> EvmResult<BlockHeader>;

    /// Total stake currently held by the staking bridge contracts.
    async fn stake_total_supply(&self) -> EvmResult<U256>;
}
