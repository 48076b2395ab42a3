//! Wallet SDK backed by an external zkLink signer service.
//!
//! The L2 key scheme is not implemented here. The L1 key stays local: it signs
//! the key-seed message (the L2 key is derived from that signature by the
//! service) and the ChangePubKey authorization message returned by the service.

use crate::eth::EthSigner;
use crate::rpc::{RpcResponse, RpcTransport};
use crate::wallet::{ChangePubKeyParams, L2Wallet, SignedChangePubKey, WalletError, WalletSdk};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Message signed by the L1 key to seed the L2 key.
pub const KEY_SEED_MESSAGE: &str = "Sign this message to create a key to interact with zkLink's layer2 services.\nNOTE: This application is powered by zkLink protocol.\n\nOnly sign this message for a trusted client!";

/// Client of the signer service, a JSON-RPC 2.0 endpoint with two methods.
///
/// - `zkl_derivePubKeyHash`, params `[seedSignature]`: the `0x` hex
///   `personal_sign` of [`KEY_SEED_MESSAGE`]. Result: the L2 pubkey hash as
///   a `0x` hex string.
/// - `zkl_signChangePubKey`, params `[seedSignature, l1Address, changePubKey]`
///   where `changePubKey` is [`ChangePubKeyParams`] in camelCase (`accountId`,
///   `subAccountId`, `chainId` when known, `ethAuthType`, `feeTokenId`, `fee`,
///   `nonce`). Result: `{"tx": {..}, "ethSignMessage": "<text>"}`. `tx` is the
///   L2-signed transaction body. `ethSignMessage` is signed here with the L1
///   key and attached to `tx` as `ethAuthData`.
///
/// Failures come back as a JSON-RPC `error` object; its `message` surfaces
/// as [`WalletError::Service`]. A missing result is
/// [`WalletError::InvalidResponse`].
pub struct SignerBridge {
    service: Arc<dyn RpcTransport>,
}

impl SignerBridge {
    pub fn new(service: Arc<dyn RpcTransport>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl WalletSdk for SignerBridge {
    type Wallet = BridgedWallet;

    async fn derive_wallet(&self, signer: &EthSigner) -> Result<BridgedWallet, WalletError> {
        let seed = signer.personal_sign(KEY_SEED_MESSAGE.as_bytes())?;
        let response = self
            .service
            .call("zkl_derivePubKeyHash", vec![json!(seed)])
            .await?;

        let pub_key_hash = match expect_result(response)? {
            Value::String(hash) => hash,
            other => {
                return Err(WalletError::InvalidResponse(format!(
                    "pubkey hash is not a string: {}",
                    other
                )))
            }
        };
        log::debug!("derived L2 pubkey hash {}", pub_key_hash);

        Ok(BridgedWallet {
            service: Arc::clone(&self.service),
            signer: signer.clone(),
            seed,
            pub_key_hash,
        })
    }
}

pub struct BridgedWallet {
    service: Arc<dyn RpcTransport>,
    signer: EthSigner,
    seed: String,
    pub_key_hash: String,
}

impl BridgedWallet {
    /// Pubkey hash of the L2 key held by this wallet.
    pub fn pub_key_hash(&self) -> &str {
        &self.pub_key_hash
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnsignedAuth {
    tx: Value,
    eth_sign_message: String,
}

#[async_trait]
impl L2Wallet for BridgedWallet {
    fn address(&self) -> &str {
        self.signer.address()
    }

    async fn is_signing_key_set(&self, pub_key_hash: &str) -> Result<bool, WalletError> {
        Ok(self.pub_key_hash.eq_ignore_ascii_case(pub_key_hash))
    }

    async fn sign_change_pub_key(
        &self,
        params: &ChangePubKeyParams,
    ) -> Result<SignedChangePubKey, WalletError> {
        let params_json =
            serde_json::to_value(params).map_err(|e| WalletError::Signing(e.to_string()))?;
        let response = self
            .service
            .call(
                "zkl_signChangePubKey",
                vec![json!(self.seed), json!(self.signer.address()), params_json],
            )
            .await?;

        let UnsignedAuth {
            mut tx,
            eth_sign_message,
        } = serde_json::from_value(expect_result(response)?)
            .map_err(|e| WalletError::InvalidResponse(e.to_string()))?;

        let eth_signature = self.signer.personal_sign(eth_sign_message.as_bytes())?;
        match tx.as_object_mut() {
            Some(body) => {
                body.insert(
                    "ethAuthData".to_string(),
                    json!({ "type": "EthECDSA", "ethSignature": eth_signature }),
                );
            }
            None => {
                return Err(WalletError::InvalidResponse(
                    "transaction body is not an object".to_string(),
                ))
            }
        }

        Ok(SignedChangePubKey { tx })
    }
}

fn expect_result(response: RpcResponse) -> Result<Value, WalletError> {
    if let Some(error) = response.error {
        return Err(WalletError::Service(error.message));
    }
    response
        .result
        .ok_or_else(|| WalletError::InvalidResponse("empty result".to_string()))
}
