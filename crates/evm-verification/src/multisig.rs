//! Multisig control bridge event verification.

use tracing::*;
use trestle_bridge_types::SignerEventKind;
use trestle_evmio::{BridgeLogEvent, ConfirmationTracker, EvmClient, LogQuery};
use trestle_primitives::Buf20;

use crate::{
    claims::{SignerClaim, ThresholdClaim},
    error::VerificationError,
    VerificationResult,
};

/// Confirms a claimed signer added/removed event against the multisig
/// control contract.
pub async fn verify_signer_event(
    client: &dyn EvmClient,
    confirmations: &ConfirmationTracker,
    control_address: Buf20,
    claim: &SignerClaim,
) -> VerificationResult<()> {
    let query = LogQuery::at_block(claim.block_number, vec![control_address]);
    let logs = client.filter_bridge_logs(query).await?;

    let found = logs.iter().any(|log| {
        if !log.at_position(claim.block_number, claim.log_index, &claim.tx_hash) {
            return false;
        }
        match (&log.event, claim.kind) {
            (BridgeLogEvent::SignerAdded { signer, nonce }, SignerEventKind::Added) => {
                *signer == claim.address && *nonce == claim.nonce
            }
            (BridgeLogEvent::SignerRemoved { signer, nonce }, SignerEventKind::Removed) => {
                *signer == claim.address && *nonce == claim.nonce
            }
            _ => false,
        }
    });

    if !found {
        debug!(
            signer = %claim.address,
            block = %claim.block_number,
            "claimed signer event not found on chain"
        );
        return Err(VerificationError::NoSignerEventFound);
    }

    confirmations.check(claim.block_number).await?;
    Ok(())
}

/// Confirms a claimed threshold set event against the multisig control
/// contract.
pub async fn verify_threshold_set(
    client: &dyn EvmClient,
    confirmations: &ConfirmationTracker,
    control_address: Buf20,
    claim: &ThresholdClaim,
) -> VerificationResult<()> {
    let query = LogQuery::at_block(claim.block_number, vec![control_address]);
    let logs = client.filter_bridge_logs(query).await?;

    let found = logs.iter().any(|log| {
        log.at_position(claim.block_number, claim.log_index, &claim.tx_hash)
            && matches!(
                &log.event,
                BridgeLogEvent::ThresholdSet { threshold, nonce }
                    if *threshold == claim.threshold && *nonce == claim.nonce
            )
    });

    if !found {
        debug!(
            threshold = %claim.threshold,
            block = %claim.block_number,
            "claimed threshold event not found on chain"
        );
        return Err(VerificationError::NoThresholdSetEventFound);
    }

    confirmations.check(claim.block_number).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use trestle_evmio::{BridgeLog, MockEvmClient};
    use trestle_primitives::{Buf32, U256};

    use super::*;

    fn control() -> Buf20 {
        Buf20::from([0xcc; 20])
    }

    fn signer_claim() -> SignerClaim {
        SignerClaim {
            address: Buf20::from([1; 20]),
            kind: SignerEventKind::Added,
            nonce: U256::from(7u64),
            block_number: 10,
            log_index: 0,
            tx_hash: Buf32::from([2; 32]),
        }
    }

    fn signer_log() -> BridgeLog {
        BridgeLog {
            contract: control(),
            block_number: 10,
            log_index: 0,
            tx_hash: Buf32::from([2; 32]),
            event: BridgeLogEvent::SignerAdded {
                signer: Buf20::from([1; 20]),
                nonce: U256::from(7u64),
            },
        }
    }

    fn setup(logs: Vec<BridgeLog>) -> (MockEvmClient, ConfirmationTracker) {
        let mut client = MockEvmClient::new();
        client
            .expect_filter_bridge_logs()
            .returning(move |_| Ok(logs.clone()));

        let mut conf_client = MockEvmClient::new();
        conf_client.expect_current_height().returning(|| Ok(1000));
        (client, ConfirmationTracker::new(Arc::new(conf_client), 6))
    }

    #[tokio::test]
    async fn test_signer_event_match() {
        let (client, tracker) = setup(vec![signer_log()]);
        assert!(
            verify_signer_event(&client, &tracker, control(), &signer_claim())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_signer_nonce_mismatch() {
        let mut claim = signer_claim();
        claim.nonce = U256::from(8u64);
        let (client, tracker) = setup(vec![signer_log()]);
        let err = verify_signer_event(&client, &tracker, control(), &claim)
            .await
            .unwrap_err();
        assert!(matches!(err, VerificationError::NoSignerEventFound));
    }

    #[tokio::test]
    async fn test_threshold_match_and_mismatch() {
        let log = BridgeLog {
            contract: control(),
            block_number: 10,
            log_index: 1,
            tx_hash: Buf32::from([3; 32]),
            event: BridgeLogEvent::ThresholdSet {
                threshold: 667,
                nonce: U256::from(9u64),
            },
        };
        let claim = ThresholdClaim {
            threshold: 667,
            nonce: U256::from(9u64),
            block_number: 10,
            log_index: 1,
            tx_hash: Buf32::from([3; 32]),
        };
        let (client, tracker) = setup(vec![log]);
        assert!(
            verify_threshold_set(&client, &tracker, control(), &claim)
                .await
                .is_ok()
        );

        let mut bad = claim.clone();
        bad.threshold = 500;
        let (client, tracker) = setup(vec![BridgeLog {
            contract: control(),
            block_number: 10,
            log_index: 1,
            tx_hash: Buf32::from([3; 32]),
            event: BridgeLogEvent::ThresholdSet {
                threshold: 667,
                nonce: U256::from(9u64),
            },
        }]);
        assert!(matches!(
            verify_threshold_set(&client, &tracker, control(), &bad).await,
            Err(VerificationError::NoThresholdSetEventFound)
        ));
    }
}
