//! Confirmation depth checking.

use std::sync::Arc;

use tracing::*;

use crate::{client::EvmClient, error::EvmError, EvmResult};

/// Checks that a block is buried under at least `required` further
/// blocks before anything in it is trusted.
#[derive(Clone)]
pub struct ConfirmationTracker {
    client: Arc<dyn EvmClient>,
    required: u64,
}

impl std::fmt::Debug for ConfirmationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationTracker")
            .field("required", &self.required)
            .finish_non_exhaustive()
    }
}

impl ConfirmationTracker {
    pub fn new(client: Arc<dyn EvmClient>, required: u64) -> Self {
        Self { client, required }
    }

    pub fn required(&self) -> u64 {
        self.required
    }

    /// Errors unless `block` has at least the required confirmation
    /// depth. Safe to call repeatedly; depth only grows.
    pub async fn check(&self, block: u64) -> EvmResult<()> {
        let height = self.client.current_height().await?;
        let have = height.saturating_sub(block);
        if have < self.required {
            debug!(%block, %have, need = %self.required, "confirmation depth not reached");
            return Err(EvmError::InsufficientConfirmations {
                block,
                have,
                need: self.required,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockEvmClient;

    fn tracker(height: u64, required: u64) -> ConfirmationTracker {
        let mut client = MockEvmClient::new();
        client
            .expect_current_height()
            .returning(move || Ok(height));
        ConfirmationTracker::new(Arc::new(client), required)
    }

    #[tokio::test]
    async fn test_depth_reached() {
        assert!(tracker(110, 10).check(100).await.is_ok());
        assert!(tracker(200, 10).check(100).await.is_ok());
    }

    #[tokio::test]
    async fn test_depth_not_reached() {
        let err = tracker(105, 10).check(100).await.unwrap_err();
        assert!(matches!(
            err,
            EvmError::InsufficientConfirmations {
                block: 100,
                have: 5,
                need: 10
            }
        ));
        // Block ahead of the node tip behaves the same way.
        assert!(tracker(50, 10).check(100).await.is_err());
    }
}
