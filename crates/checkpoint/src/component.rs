//! Checkpointable components and their fixed ordering.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

/// Names of checkpointable components.
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
pub enum ComponentName {
    Validators,
    Assets,
    Collateral,
    NetParams,
    MarketActivity,
    Execution,
    Governance,
    Epoch,
    BridgeControl,
    Staking,
    Delegation,
    Rewards,
    Banking,
}

/// The serialization order of components within a checkpoint. Hand
/// ordered along real data dependencies (assets must exist before
/// collateral references them, and so on); registration order never
/// matters.
pub const CHECKPOINT_ORDER: [ComponentName; 13] = [
    ComponentName::Validators,
    ComponentName::Assets,
    ComponentName::Collateral,
    ComponentName::NetParams,
    ComponentName::MarketActivity,
    ComponentName::Execution,
    ComponentName::Governance,
    ComponentName::Epoch,
    ComponentName::BridgeControl,
    ComponentName::Staking,
    ComponentName::Delegation,
    ComponentName::Rewards,
    ComponentName::Banking,
];

/// State threaded through a restore, in component order.
///
/// The assets component records which assets its bytes newly enabled;
/// the collateral component consumes that list to pre-enable them
/// before decoding balances that reference them.
#[derive(Debug, Default)]
pub struct LoadContext {
    pub enabled_assets: Vec<String>,
}

/// A component whose state enters the checkpoint.
pub trait Component {
    fn name(&self) -> ComponentName;

    /// Serializes current state. Must be a pure function of in-memory
    /// state: identical state yields identical bytes.
    fn serialize(&self) -> anyhow::Result<Vec<u8>>;

    /// Replaces current state with the checkpointed bytes. Errors are
    /// fatal to the whole restore.
    fn load(&mut self, data: &[u8], ctx: &mut LoadContext) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_covers_every_name_once() {
        let mut seen = std::collections::HashSet::new();
        for name in CHECKPOINT_ORDER {
            assert!(seen.insert(name), "{name:?} listed twice");
        }
        assert_eq!(seen.len(), 13);
    }

    #[test]
    fn test_assets_precede_collateral() {
        let pos = |n| CHECKPOINT_ORDER.iter().position(|x| *x == n).unwrap();
        assert!(pos(ComponentName::Assets) < pos(ComponentName::Collateral));
        assert!(pos(ComponentName::Validators) < pos(ComponentName::Assets));
        assert!(pos(ComponentName::Staking) < pos(ComponentName::Delegation));
    }
}
