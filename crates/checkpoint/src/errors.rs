//! Checkpoint error types.

use thiserror::Error;
use trestle_primitives::Buf32;

use crate::component::ComponentName;

pub type CheckpointResult<T> = Result<T, CheckpointError>;

#[derive(Debug, Error)]
pub enum CheckpointError {
    /// A restore was attempted without a trusted hash configured.
    #[error("no checkpoint expected to be restored")]
    NoCheckpointExpectedToBeRestored,

    /// The checkpoint's content hash does not match the trusted hash.
    #[error("incompatible hashes: expected {expected:?}, got {got:?}")]
    IncompatibleHashes { expected: Buf32, got: Buf32 },

    /// The checkpoint carries data for a component nothing registered.
    /// Skipping it would silently diverge this replica, so the restore
    /// aborts instead.
    #[error("unknown checkpoint name {0:?}")]
    UnknownCheckpointName(ComponentName),

    /// A component failed to serialize its state.
    #[error("serializing component {name:?}")]
    ComponentSerialize {
        name: ComponentName,
        #[source]
        source: anyhow::Error,
    },

    /// A component rejected its persisted bytes. The node cannot
    /// proceed with partial state.
    #[error("loading component {name:?}")]
    ComponentLoad {
        name: ComponentName,
        #[source]
        source: anyhow::Error,
    },
}
