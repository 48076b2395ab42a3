use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Content type sent with every request. The zkLink gateway expects the charset.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Requests are issued strictly one after another, so the id is never used for correlation.
pub const REQUEST_ID: u64 = 1;

/// Failures below the JSON-RPC layer. These are never retried.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("response is not a JSON-RPC envelope: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: &str, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: REQUEST_ID,
        }
    }
}

/// Response envelope, returned as the server sent it.
///
/// A `null` result deserializes to `None`, the same as a missing one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: Option<i64>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcResponse {
    pub fn from_result(result: Value) -> Self {
        Self {
            result: Some(result),
            error: None,
        }
    }

    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(RpcErrorObject {
                code: None,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}

/// A JSON-RPC endpoint. The zkLink methods used by activation are provided on top of `call`.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<RpcResponse, TransportError>;

    async fn get_account(&self, address: &str) -> Result<RpcResponse, TransportError> {
        self.call("getAccount", vec![json!(address)]).await
    }

    async fn get_account_balances(&self, account_id: u64) -> Result<RpcResponse, TransportError> {
        self.call("getAccountBalances", vec![json!(account_id)]).await
    }

    async fn get_change_pubkey_chain_id(&self) -> Result<RpcResponse, TransportError> {
        self.call("getChangePubkeyChainId", vec![]).await
    }

    async fn get_transaction_by_hash(&self, hash: &str) -> Result<RpcResponse, TransportError> {
        self.call("getTransactionByHash", vec![json!(hash), json!(false)])
            .await
    }

    async fn send_transaction(&self, tx: Value) -> Result<RpcResponse, TransportError> {
        self.call("sendTransaction", vec![tx, Value::Null, Value::Null])
            .await
    }
}

/// HTTP transport for a single, fixed endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: Client,
    url: String,
}

impl RpcClient {
    pub fn new(url: String, timeout: u64) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(TransportError::Client)?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RpcTransport for RpcClient {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<RpcResponse, TransportError> {
        let request = RpcRequest::new(method, params);
        let body = serde_json::to_vec(&request)?;

        log::debug!("rpc -> {} {}", method, self.url);

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: self.url.clone(),
                source,
            })?;

        // The status code is not inspected; the body decides.
        let bytes = response.bytes().await.map_err(TransportError::Body)?;
        let envelope: RpcResponse = serde_json::from_slice(&bytes)?;

        log::trace!("rpc <- {} {:?}", method, envelope);
        Ok(envelope)
    }
}
