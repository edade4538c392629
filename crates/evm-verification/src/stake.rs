//! Stake bridge event verification.

use tracing::*;
use trestle_bridge_types::StakeEventKind;
use trestle_evmio::{BridgeLogEvent, ConfirmationTracker, EvmClient, LogQuery};
use trestle_primitives::{Buf20, U256};

use crate::{claims::StakeClaim, error::VerificationError, VerificationResult};

/// Confirms that the bridge's total staked supply matches the claimed
/// value. Used by the total-supply watch; a mismatch is a definitive
/// rejection, not a retryable condition.
pub async fn verify_stake_total_supply(
    client: &dyn EvmClient,
    expected: U256,
) -> VerificationResult<()> {
    let actual = client.stake_total_supply().await?;
    if actual != expected {
        debug!(%expected, %actual, "stake total supply mismatch");
        return Err(VerificationError::TotalSupplyMismatch { expected, actual });
    }
    Ok(())
}

/// Confirms that the claimed stake event exists on chain at the claimed
/// position with exactly the claimed fields.
///
/// `bridge_addresses` are the staking bridge contracts to query; the
/// original deployment plus any successor contract.
pub async fn verify_stake_event(
    client: &dyn EvmClient,
    confirmations: &ConfirmationTracker,
    bridge_addresses: &[Buf20],
    claim: &StakeClaim,
) -> VerificationResult<()> {
    let query = LogQuery::at_block(claim.block_number, bridge_addresses.to_vec());
    let logs = client.filter_bridge_logs(query).await?;

    let found = logs.iter().any(|log| {
        if !log.at_position(claim.block_number, claim.log_index, &claim.tx_hash) {
            return false;
        }
        match (&log.event, claim.kind) {
            (BridgeLogEvent::StakeDeposited { party, amount }, StakeEventKind::Deposited) => {
                *party == claim.party && *amount == claim.amount
            }
            (BridgeLogEvent::StakeRemoved { party, amount }, StakeEventKind::Removed) => {
                *party == claim.party && *amount == claim.amount
            }
            _ => false,
        }
    });

    if !found {
        debug!(
            party = %claim.party,
            block = %claim.block_number,
            "claimed stake event not found on chain"
        );
        return Err(match claim.kind {
            StakeEventKind::Deposited => VerificationError::NoStakeDepositedEventFound,
            StakeEventKind::Removed => VerificationError::NoStakeRemovedEventFound,
        });
    }

    confirmations.check(claim.block_number).await?;
    Ok(())
}
