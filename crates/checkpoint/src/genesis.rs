//! Genesis-supplied checkpoint restore input.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trestle_primitives::Buf32;

use crate::types::Checkpoint;

#[derive(Debug, Error)]
pub enum GenesisRestoreError {
    /// Hash without state or state without hash is a broken config,
    /// fatal at startup.
    #[error("checkpoint hash and state must both be set or both be absent")]
    PartialConfig,

    #[error("malformed checkpoint hash: {0}")]
    MalformedHash(String),

    #[error("malformed checkpoint state: {0}")]
    MalformedState(String),
}

/// The restore pair as it appears in genesis: a hex content hash and
/// the base64 of the borsh-serialized checkpoint.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GenesisRestore {
    #[serde(default)]
    pub checkpoint_hash: Option<String>,

    #[serde(default)]
    pub checkpoint_state: Option<String>,
}

impl GenesisRestore {
    /// Validates and decodes the pair. Returns `None` when neither is
    /// set (fresh chain, nothing to restore).
    pub fn decode(&self) -> Result<Option<(Buf32, Checkpoint)>, GenesisRestoreError> {
        let (hash, state) = match (&self.checkpoint_hash, &self.checkpoint_state) {
            (None, None) => return Ok(None),
            (Some(h), Some(s)) => (h, s),
            _ => return Err(GenesisRestoreError::PartialConfig),
        };

        let hash = hash
            .parse::<Buf32>()
            .map_err(|e| GenesisRestoreError::MalformedHash(e.to_string()))?;

        let raw = base64::engine::general_purpose::STANDARD
            .decode(state)
            .map_err(|e| GenesisRestoreError::MalformedState(e.to_string()))?;
        let checkpoint: Checkpoint = borsh::from_slice(&raw)
            .map_err(|e| GenesisRestoreError::MalformedState(e.to_string()))?;

        Ok(Some((hash, checkpoint)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{component::ComponentName, types::CheckpointEntry};

    fn sample_checkpoint() -> Checkpoint {
        Checkpoint::new(
            vec![CheckpointEntry {
                name: ComponentName::Staking,
                data: vec![1, 2, 3],
            }],
            9,
        )
    }

    fn encode(cp: &Checkpoint) -> String {
        base64::engine::general_purpose::STANDARD.encode(borsh::to_vec(cp).unwrap())
    }

    #[test]
    fn test_absent_pair_is_fresh_chain() {
        assert!(GenesisRestore::default().decode().unwrap().is_none());
    }

    #[test]
    fn test_partial_pair_fatal() {
        let g = GenesisRestore {
            checkpoint_hash: Some("aa".repeat(32)),
            checkpoint_state: None,
        };
        assert!(matches!(
            g.decode(),
            Err(GenesisRestoreError::PartialConfig)
        ));

        let g = GenesisRestore {
            checkpoint_hash: None,
            checkpoint_state: Some("AAAA".into()),
        };
        assert!(matches!(
            g.decode(),
            Err(GenesisRestoreError::PartialConfig)
        ));
    }

    #[test]
    fn test_round_trip() {
        let cp = sample_checkpoint();
        let g = GenesisRestore {
            checkpoint_hash: Some(cp.hash().to_hex()),
            checkpoint_state: Some(encode(&cp)),
        };
        let (hash, decoded) = g.decode().unwrap().unwrap();
        assert_eq!(hash, cp.hash());
        assert_eq!(decoded, cp);
    }

    #[test]
    fn test_garbage_state_rejected() {
        let cp = sample_checkpoint();
        let g = GenesisRestore {
            checkpoint_hash: Some(cp.hash().to_hex()),
            checkpoint_state: Some("!!notbase64!!".into()),
        };
        assert!(matches!(
            g.decode(),
            Err(GenesisRestoreError::MalformedState(_))
        ));
    }

    #[test]
    fn test_parses_from_json() {
        let cp = sample_checkpoint();
        let json = format!(
            r#"{{"checkpoint_hash":"{}","checkpoint_state":"{}"}}"#,
            cp.hash().to_hex(),
            encode(&cp)
        );
        let g: GenesisRestore = serde_json::from_str(&json).unwrap();
        assert!(g.decode().unwrap().is_some());
    }
}
