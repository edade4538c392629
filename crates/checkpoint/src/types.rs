//! Checkpoint data types.

use borsh::{BorshDeserialize, BorshSerialize};
use trestle_primitives::{hash, Buf32};

use crate::component::ComponentName;

/// One component's serialized state inside a checkpoint.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct CheckpointEntry {
    pub name: ComponentName,
    pub data: Vec<u8>,
}

/// A full checkpoint: component states in fixed order plus the block
/// height it was taken at. Never mutated after hashing.
#[derive(Clone, Debug, Eq, PartialEq, BorshSerialize, BorshDeserialize)]
pub struct Checkpoint {
    entries: Vec<CheckpointEntry>,
    block_height: u64,
}

impl Checkpoint {
    pub fn new(entries: Vec<CheckpointEntry>, block_height: u64) -> Self {
        Self {
            entries,
            block_height,
        }
    }

    pub fn entries(&self) -> &[CheckpointEntry] {
        &self.entries
    }

    pub fn block_height(&self) -> u64 {
        self.block_height
    }

    pub fn get(&self, name: ComponentName) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// Deterministic content hash over the serialized checkpoint.
    pub fn hash(&self) -> Buf32 {
        hash::sha256_borsh(self)
    }
}
