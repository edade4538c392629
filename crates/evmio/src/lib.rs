//! Foreign-chain (EVM) I/O boundary.
//!
//! Everything the core knows about the foreign chain comes through the
//! [`EvmClient`] trait; the concrete RPC transport lives outside the
//! workspace. Logs arrive pre-decoded into the typed bridge event model
//! so the verification layer compares fields, not ABI bytes.

pub mod client;
pub mod confirm;
pub mod error;
pub mod retry;
pub mod types;

pub use client::EvmClient;
#[cfg(any(test, feature = "mocks"))]
pub use client::MockEvmClient;
pub use confirm::ConfirmationTracker;
pub use error::{EvmError, EvmResult};
pub use retry::retry_forever;
pub use types::{BlockHeader, BridgeLog, BridgeLogEvent, LogQuery};
