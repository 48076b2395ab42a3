//! Scripted doubles for the RPC endpoint and the wallet SDK.

#![allow(dead_code)]

use async_trait::async_trait;
use l2_activate::activation::{ActivationError, Confirmation};
use l2_activate::rpc::{RpcResponse, RpcTransport, TransportError};
use l2_activate::wallet::{ChangePubKeyParams, L2Wallet, SignedChangePubKey, WalletError};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const ADDRESS: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";

/// Replies per method in order; the last reply repeats once the script runs out.
/// A method with no script fails at the transport level.
#[derive(Default)]
pub struct ScriptedRpc {
    scripts: Mutex<HashMap<String, VecDeque<RpcResponse>>>,
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl ScriptedRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, method: &str, replies: Vec<RpcResponse>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .extend(replies);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }
}

#[async_trait]
impl RpcTransport for ScriptedRpc {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<RpcResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params));

        let mut scripts = self.scripts.lock().unwrap();
        let queue = match scripts.get_mut(method) {
            Some(queue) if !queue.is_empty() => queue,
            _ => {
                let err = serde_json::from_str::<RpcResponse>("connection refused").unwrap_err();
                return Err(TransportError::InvalidJson(err));
            }
        };
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            Ok(queue.front().cloned().unwrap())
        }
    }
}

pub fn ok(result: Value) -> RpcResponse {
    RpcResponse::from_result(result)
}

pub fn err(message: &str) -> RpcResponse {
    RpcResponse::from_error(message)
}

pub fn account(id: u64, pub_key_hash: &str, nonce: u64) -> RpcResponse {
    ok(json!({ "id": id, "pubKeyHash": pub_key_hash, "nonce": nonce }))
}

pub fn receipt(executed: bool, success: Option<bool>, fail_reason: Option<&str>) -> RpcResponse {
    ok(json!({
        "txHash": "0xhash",
        "receipt": { "executed": executed, "success": success, "failReason": fail_reason }
    }))
}

/// Wallet that signs nothing: it records parameters and returns a fixed body.
pub struct FakeWallet {
    pub key_set: bool,
    pub signed: Mutex<Vec<ChangePubKeyParams>>,
    pub key_checks: AtomicUsize,
}

impl FakeWallet {
    pub fn new(key_set: bool) -> Self {
        Self {
            key_set,
            signed: Mutex::new(Vec::new()),
            key_checks: AtomicUsize::new(0),
        }
    }

    pub fn signed(&self) -> Vec<ChangePubKeyParams> {
        self.signed.lock().unwrap().clone()
    }
}

#[async_trait]
impl L2Wallet for FakeWallet {
    fn address(&self) -> &str {
        ADDRESS
    }

    async fn is_signing_key_set(&self, _pub_key_hash: &str) -> Result<bool, WalletError> {
        self.key_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.key_set)
    }

    async fn sign_change_pub_key(
        &self,
        params: &ChangePubKeyParams,
    ) -> Result<SignedChangePubKey, WalletError> {
        self.signed.lock().unwrap().push(params.clone());
        Ok(SignedChangePubKey {
            tx: json!({
                "type": "ChangePubKey",
                "accountId": params.account_id,
                "nonce": params.nonce,
                "feeToken": params.fee_token_id,
            }),
        })
    }
}

/// Answers every prompt the same way and counts how often it was asked.
pub struct FixedAnswer {
    pub answer: bool,
    pub asked: AtomicUsize,
}

impl FixedAnswer {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            asked: AtomicUsize::new(0),
        }
    }
}

impl Confirmation for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> Result<bool, ActivationError> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer)
    }
}
