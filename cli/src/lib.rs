// zkLink Layer-2 account activation library

// Enforce panic-free code in production
#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![cfg_attr(not(test), warn(clippy::expect_used))]
#![cfg_attr(not(test), warn(clippy::panic))]
// Test-specific allows
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod activation;
pub mod bridge;
pub mod config;
pub mod eth;
pub mod output;
pub mod poller;
pub mod rpc;
pub mod types;
pub mod wallet;

pub use activation::{ActivationError, ActivationOutcome, Activator, AssumeYes, Confirmation};
pub use rpc::{RpcClient, RpcResponse, RpcTransport, TransportError};
pub use wallet::{ChangePubKeyParams, L2Wallet, SignedChangePubKey, WalletError, WalletSdk};
