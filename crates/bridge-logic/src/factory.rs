//! Rebuilds witness check closures from persisted claim data.
//!
//! Claims are stored as plain structs; the foreign-chain client handle
//! they need at check time lives only here. At process time and again
//! after a checkpoint restore, the factory turns a claim into a fresh
//! closure for [`trestle_witness::WitnessCoordinator`].

use std::sync::Arc;

use trestle_evm_verification::{
    verify_signer_event, verify_stake_event, verify_stake_total_supply, verify_threshold_set,
    SignerClaim, StakeClaim, ThresholdClaim, VerificationError,
};
use trestle_evmio::{ConfirmationTracker, EvmClient};
use trestle_primitives::Buf20;
use trestle_witness::{CheckError, CheckFuture};

use crate::claims::{ControlPending, StakePending};

/// A rebuilt check body, one attempt per call.
pub type CheckFn = Box<dyn Fn() -> CheckFuture + Send + Sync>;

/// Builds check closures over a shared foreign-chain client.
#[derive(Clone)]
pub struct CheckFactory {
    client: Arc<dyn EvmClient>,
    confirmations: ConfirmationTracker,
    bridge_addresses: Vec<Buf20>,
    control_address: Buf20,
}

impl std::fmt::Debug for CheckFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckFactory")
            .field("bridge_addresses", &self.bridge_addresses)
            .field("control_address", &self.control_address)
            .finish_non_exhaustive()
    }
}

impl CheckFactory {
    pub fn new(
        client: Arc<dyn EvmClient>,
        confirmations: ConfirmationTracker,
        bridge_addresses: Vec<Buf20>,
        control_address: Buf20,
    ) -> Self {
        Self {
            client,
            confirmations,
            bridge_addresses,
            control_address,
        }
    }

    /// Check body for a stake verifier claim.
    pub fn stake_check(&self, claim: &StakePending) -> CheckFn {
        match claim {
            StakePending::Linking(fact) => {
                let client = self.client.clone();
                let confirmations = self.confirmations.clone();
                let addresses = self.bridge_addresses.clone();
                let claim = StakeClaim::from(fact);
                Box::new(move || {
                    let client = client.clone();
                    let confirmations = confirmations.clone();
                    let addresses = addresses.clone();
                    let claim = claim.clone();
                    Box::pin(async move {
                        verify_stake_event(client.as_ref(), &confirmations, &addresses, &claim)
                            .await
                            .map_err(into_check_error)
                    })
                })
            }
            StakePending::TotalSupply { expected, .. } => {
                let client = self.client.clone();
                let expected = *expected;
                Box::new(move || {
                    let client = client.clone();
                    Box::pin(async move {
                        verify_stake_total_supply(client.as_ref(), expected)
                            .await
                            .map_err(into_check_error)
                    })
                })
            }
            StakePending::Heartbeat { block, .. } => {
                // Resolves once the chain serves the block; every error
                // here is transient, so only window expiry can reject.
                let client = self.client.clone();
                let block = *block;
                Box::new(move || {
                    let client = client.clone();
                    Box::pin(async move {
                        match client.header_by_number(block).await {
                            Ok(_) => Ok(()),
                            Err(e) if e.is_transient() => {
                                Err(CheckError::transient(e.to_string()))
                            }
                            Err(e) => Err(CheckError::failed(e.to_string())),
                        }
                    })
                })
            }
        }
    }

    /// Check body for a multisig topology claim.
    pub fn control_check(&self, claim: &ControlPending) -> CheckFn {
        match claim {
            ControlPending::Signer(fact) => {
                let client = self.client.clone();
                let confirmations = self.confirmations.clone();
                let control = self.control_address;
                let claim = SignerClaim {
                    address: fact.address,
                    kind: fact.kind,
                    nonce: fact.nonce,
                    block_number: fact.block_number,
                    log_index: fact.log_index,
                    tx_hash: fact.tx_hash,
                };
                Box::new(move || {
                    let client = client.clone();
                    let confirmations = confirmations.clone();
                    let claim = claim.clone();
                    Box::pin(async move {
                        verify_signer_event(client.as_ref(), &confirmations, control, &claim)
                            .await
                            .map_err(into_check_error)
                    })
                })
            }
            ControlPending::Threshold(fact) => {
                let client = self.client.clone();
                let confirmations = self.confirmations.clone();
                let control = self.control_address;
                let claim = ThresholdClaim {
                    threshold: fact.threshold,
                    nonce: fact.nonce,
                    block_number: fact.block_number,
                    log_index: fact.log_index,
                    tx_hash: fact.tx_hash,
                };
                Box::new(move || {
                    let client = client.clone();
                    let confirmations = confirmations.clone();
                    let claim = claim.clone();
                    Box::pin(async move {
                        verify_threshold_set(client.as_ref(), &confirmations, control, &claim)
                            .await
                            .map_err(into_check_error)
                    })
                })
            }
        }
    }
}

fn into_check_error(e: VerificationError) -> CheckError {
    if e.is_transient() {
        CheckError::transient(e.to_string())
    } else {
        CheckError::failed(e.to_string())
    }
}
