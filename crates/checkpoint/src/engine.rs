//! The checkpoint engine.

use std::collections::HashMap;

use tracing::*;
use trestle_primitives::Buf32;

use crate::{
    component::{Component, ComponentName, LoadContext, CHECKPOINT_ORDER},
    errors::{CheckpointError, CheckpointResult},
    types::{Checkpoint, CheckpointEntry},
};

/// Orchestrates ordered serialize/restore of every registered
/// component.
///
/// Lives on the deterministic tick path; `checkpoint` is driven by the
/// consensus-ordered block time so every replica produces the same
/// bytes at the same tick.
pub struct CheckpointEngine {
    components: HashMap<ComponentName, Box<dyn Component>>,

    /// Interval between timed checkpoints, seconds.
    delta: i64,

    /// Next time a timed checkpoint fires; zero until the first tick
    /// seeds it.
    next_checkpoint_at: i64,

    /// Current block height, stamped into produced checkpoints.
    block_height: u64,

    /// Hash we are willing to restore, from genesis. `None` means no
    /// restore is expected at all.
    trusted_hash: Option<Buf32>,
}

impl std::fmt::Debug for CheckpointEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckpointEngine")
            .field("delta", &self.delta)
            .field("next_checkpoint_at", &self.next_checkpoint_at)
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl CheckpointEngine {
    pub fn new(delta: i64, trusted_hash: Option<Buf32>) -> Self {
        Self {
            components: HashMap::new(),
            delta,
            next_checkpoint_at: 0,
            block_height: 0,
            trusted_hash,
        }
    }

    /// Registers a component. Registering two components under one name
    /// is a programming error and panics: both would claim the same
    /// checkpoint slot and replicas could diverge on which wins.
    pub fn register(&mut self, component: Box<dyn Component>) {
        let name = component.name();
        if self.components.insert(name, component).is_some() {
            error!(?name, "duplicate checkpoint component registration");
            panic!("checkpoint: component {name:?} registered twice");
        }
    }

    pub fn set_block_height(&mut self, height: u64) {
        self.block_height = height;
    }

    /// Timed checkpoint driver, called once per tick with the
    /// consensus block time. Returns the produced checkpoint when the
    /// timer fires, `None` otherwise. The first tick only seeds the
    /// timer.
    pub fn checkpoint(&mut self, t: i64) -> CheckpointResult<Option<Checkpoint>> {
        if self.next_checkpoint_at == 0 {
            self.next_checkpoint_at = t + self.delta;
            return Ok(None);
        }
        if t < self.next_checkpoint_at {
            return Ok(None);
        }
        self.next_checkpoint_at = t + self.delta;
        self.produce().map(Some)
    }

    /// Forces a full checkpoint regardless of timer state. Used around
    /// deposit/withdrawal boundaries where balances must be pinned.
    pub fn balance_checkpoint(&mut self) -> CheckpointResult<Checkpoint> {
        self.produce()
    }

    fn produce(&self) -> CheckpointResult<Checkpoint> {
        let mut entries = Vec::with_capacity(self.components.len());
        for name in CHECKPOINT_ORDER {
            let Some(component) = self.components.get(&name) else {
                continue;
            };
            let data = component
                .serialize()
                .map_err(|source| CheckpointError::ComponentSerialize { name, source })?;
            entries.push(CheckpointEntry { name, data });
        }
        let cp = Checkpoint::new(entries, self.block_height);
        info!(
            height = %self.block_height,
            hash = ?cp.hash(),
            "produced checkpoint"
        );
        Ok(cp)
    }

    /// Restores all registered components from the checkpoint.
    ///
    /// Requires a trusted hash to have been configured and to match the
    /// checkpoint's content hash exactly; no state is touched
    /// otherwise. Component loads happen in the fixed order; any
    /// failure aborts the restore and is fatal to the node.
    pub fn load(&mut self, checkpoint: &Checkpoint) -> CheckpointResult<()> {
        let got = checkpoint.hash();
        let Some(expected) = self.trusted_hash else {
            return Err(CheckpointError::NoCheckpointExpectedToBeRestored);
        };
        if expected != got {
            return Err(CheckpointError::IncompatibleHashes { expected, got });
        }

        // Validate coverage before mutating anything: data for a
        // component nothing registered must abort, not skip.
        for entry in checkpoint.entries() {
            if !self.components.contains_key(&entry.name) {
                return Err(CheckpointError::UnknownCheckpointName(entry.name));
            }
        }

        let mut ctx = LoadContext::default();
        for name in CHECKPOINT_ORDER {
            let Some(data) = checkpoint.get(name) else {
                continue;
            };
            let component = self
                .components
                .get_mut(&name)
                .expect("checkpoint: coverage validated above");
            component
                .load(data, &mut ctx)
                .map_err(|source| CheckpointError::ComponentLoad { name, source })?;
            debug!(?name, "restored checkpoint component");
        }

        self.block_height = checkpoint.block_height();
        info!(height = %self.block_height, hash = ?got, "checkpoint restored");
        Ok(())
    }
}
