//! Shapes of the zkLink RPC results read by the activation flow.
//!
//! Results are kept as raw JSON until a poll decides they are ready, and only
//! then decoded into these types. Fields the tool does not read are ignored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sub-account whose balances pay the activation fee.
pub const FEE_SUB_ACCOUNT: &str = "0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub id: u64,
    pub pub_key_hash: String,
    pub nonce: u64,
}

impl AccountState {
    /// `true` when `result.id` is present and truthy, i.e. the account exists on L2.
    pub fn has_id(result: &Value) -> bool {
        match result.get("id") {
            Some(Value::Number(n)) => n.as_f64().map_or(false, |v| v != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Bool(b)) => *b,
            Some(Value::Null) | None => false,
            Some(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub executed: bool,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub fail_reason: Option<String>,
}

impl TransactionReceipt {
    /// Only an explicit `success: false` counts as a failed execution.
    pub fn failed(&self) -> bool {
        self.success == Some(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub receipt: TransactionReceipt,
}

impl TransactionInfo {
    pub fn is_executed(result: &Value) -> bool {
        result
            .get("receipt")
            .and_then(|r| r.get("executed"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Fee token of a sub-account: the first token id in natural key order.
///
/// Token ids are integer keys, which order numerically (`"5"` before `"10"`),
/// not lexically. Keys that are not token ids are skipped.
pub fn first_token_id(tokens: &Map<String, Value>) -> Option<u32> {
    tokens.keys().filter_map(|k| k.parse::<u32>().ok()).min()
}
