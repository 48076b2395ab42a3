//! The wallet SDK seam.
//!
//! Activation only needs three things from a zkLink wallet SDK: derive a wallet
//! from an L1 signer, tell whether a signing key is already registered, and sign
//! a ChangePubKey transaction. The cryptography behind them lives elsewhere.

use crate::eth::EthSigner;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid private key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("signer service error: {0}")]
    Service(String),

    #[error("unexpected signer response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Transport(#[from] crate::rpc::TransportError),
}

/// How the new key is authorized on L1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EthAuthType {
    #[serde(rename = "EthECDSA")]
    EthEcdsa,
}

/// Inputs of a ChangePubKey signature.
///
/// `chain_id` is `None` when the chain id lookup failed; the field is then
/// left out of the serialized parameters entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePubKeyParams {
    pub account_id: u64,
    pub sub_account_id: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub eth_auth_type: EthAuthType,
    pub fee_token_id: u32,
    pub fee: String,
    pub nonce: u64,
}

/// Signed payload; `tx` is submitted as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedChangePubKey {
    pub tx: Value,
}

#[async_trait]
pub trait WalletSdk: Send + Sync {
    type Wallet: L2Wallet;

    async fn derive_wallet(&self, signer: &EthSigner) -> Result<Self::Wallet, WalletError>;
}

#[async_trait]
pub trait L2Wallet: Send + Sync {
    /// L1 address the L2 account is registered under.
    fn address(&self) -> &str;

    async fn is_signing_key_set(&self, pub_key_hash: &str) -> Result<bool, WalletError>;

    async fn sign_change_pub_key(
        &self,
        params: &ChangePubKeyParams,
    ) -> Result<SignedChangePubKey, WalletError>;
}
