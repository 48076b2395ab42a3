//! Retry-until-ready polling.
//!
//! Polls have no attempt limit and no deadline: on-chain finality has no fixed
//! bound, so a poll only ends when the awaited condition holds or the check
//! itself fails at the transport level.

use crate::rpc::RpcResponse;
use crate::types::{first_token_id, AccountState, FEE_SUB_ACCOUNT, TransactionInfo};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Pause between two checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// What a single check observed.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Ready(T),
    NotReady,
    Errored(String),
}

/// Run `check` until it reports `Ready`, sleeping `interval` between attempts.
///
/// `Errored` is logged as a warning and polling continues. An `Err` from the
/// check aborts the poll and is returned as is.
pub async fn poll_until<T, E, F, Fut>(interval: Duration, mut check: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollOutcome<T>, E>>,
{
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        match check().await? {
            PollOutcome::Ready(value) => return Ok(value),
            PollOutcome::NotReady => {
                log::debug!("poll attempt {} not ready", attempt);
            }
            PollOutcome::Errored(message) => {
                log::warn!("[ERROR] {}", message);
            }
        }
        tokio::time::sleep(interval).await;
    }
}

/// `getAccount` check: ready once the account has an id and decodes.
///
/// An account whose id is set but whose fields do not decode (an id sent as a
/// string, say) is reported and polled again.
pub fn account_ready(response: RpcResponse) -> PollOutcome<AccountState> {
    classify(response, "account state", AccountState::has_id)
}

/// `getTransactionByHash` check: ready once the receipt says executed.
pub fn transaction_executed(response: RpcResponse) -> PollOutcome<TransactionInfo> {
    classify(response, "transaction receipt", TransactionInfo::is_executed)
}

fn classify<T: DeserializeOwned>(
    response: RpcResponse,
    what: &str,
    is_ready: fn(&Value) -> bool,
) -> PollOutcome<T> {
    let RpcResponse { result, error } = response;
    match result {
        Some(result) if is_ready(&result) => match serde_json::from_value(result) {
            Ok(value) => {
                // An error next to a usable result is still reported.
                if let Some(error) = error {
                    log::warn!("[ERROR] {}", error.message);
                }
                PollOutcome::Ready(value)
            }
            Err(e) => PollOutcome::Errored(format!("malformed {}: {}", what, e)),
        },
        _ => match error {
            Some(error) => PollOutcome::Errored(error.message),
            None => PollOutcome::NotReady,
        },
    }
}

/// `getAccountBalances` check: ready once sub-account 0 holds a token.
///
/// Balances without sub-account 0 are reported as an error but never end the poll.
pub fn fee_token_ready(response: RpcResponse) -> PollOutcome<u32> {
    if let Some(error) = response.error {
        return PollOutcome::Errored(error.message);
    }

    let balances = match response.result {
        Some(Value::Object(balances)) if !balances.is_empty() => balances,
        _ => return PollOutcome::NotReady,
    };

    match balances.get(FEE_SUB_ACCOUNT) {
        Some(Value::Object(tokens)) => match first_token_id(tokens) {
            Some(token_id) => PollOutcome::Ready(token_id),
            None => PollOutcome::NotReady,
        },
        _ => PollOutcome::Errored(format!(
            "no balances found in sub-account {}",
            FEE_SUB_ACCOUNT
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn sleeps_fixed_interval_between_attempts() {
        let attempts = AtomicUsize::new(0);
        let start = Instant::now();

        let value = poll_until(DEFAULT_POLL_INTERVAL, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok::<_, Infallible>(match n {
                    0 => PollOutcome::NotReady,
                    1 => PollOutcome::Errored("Account not exist".to_string()),
                    _ => PollOutcome::Ready(42),
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "slept {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "slept {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn ready_on_first_attempt_does_not_sleep() {
        let start = Instant::now();
        let value = poll_until(DEFAULT_POLL_INTERVAL, || async {
            Ok::<_, Infallible>(PollOutcome::Ready("done"))
        })
        .await
        .unwrap();

        assert_eq!(value, "done");
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn errors_never_end_the_poll() {
        let attempts = AtomicUsize::new(0);
        let value = poll_until(DEFAULT_POLL_INTERVAL, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                Ok::<_, Infallible>(if n < 50 {
                    PollOutcome::Errored(format!("failure {}", n))
                } else {
                    PollOutcome::Ready(n)
                })
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 50);
    }

    #[tokio::test(start_paused = true)]
    async fn check_failure_aborts() {
        let result: Result<u8, &str> =
            poll_until(DEFAULT_POLL_INTERVAL, || async { Err("connection refused") }).await;
        assert_eq!(result, Err("connection refused"));
    }

    #[test]
    fn account_check_classification() {
        assert_eq!(
            account_ready(RpcResponse::from_error("Account not exist")),
            PollOutcome::Errored("Account not exist".to_string())
        );
        assert_eq!(account_ready(RpcResponse::default()), PollOutcome::NotReady);
        assert_eq!(
            account_ready(RpcResponse::from_result(json!({"id": 0, "nonce": 0}))),
            PollOutcome::NotReady
        );

        let ready = json!({"id": 7, "pubKeyHash": "0x00", "nonce": 3});
        assert_eq!(
            account_ready(RpcResponse::from_result(ready)),
            PollOutcome::Ready(AccountState {
                id: 7,
                pub_key_hash: "0x00".to_string(),
                nonce: 3,
            })
        );
    }

    #[test]
    fn undecodable_account_is_errored_not_ready() {
        let string_id = json!({"id": "7", "pubKeyHash": "0x00", "nonce": 3});
        match account_ready(RpcResponse::from_result(string_id)) {
            PollOutcome::Errored(message) => {
                assert!(message.starts_with("malformed account state"), "{}", message)
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let no_nonce = json!({"id": 7, "pubKeyHash": "0x00"});
        assert!(matches!(
            account_ready(RpcResponse::from_result(no_nonce)),
            PollOutcome::Errored(_)
        ));
    }

    #[test]
    fn account_with_error_alongside_is_ready() {
        let mut response = RpcResponse::from_error("stale");
        response.result = Some(json!({"id": 7, "pubKeyHash": "0x00", "nonce": 3}));
        assert!(matches!(account_ready(response), PollOutcome::Ready(_)));
    }

    #[test]
    fn transaction_check_classification() {
        let pending = json!({"receipt": {"executed": false, "success": null}});
        assert_eq!(
            transaction_executed(RpcResponse::from_result(pending)),
            PollOutcome::NotReady
        );
        assert_eq!(
            transaction_executed(RpcResponse::from_error("tx not found")),
            PollOutcome::Errored("tx not found".to_string())
        );

        let done = json!({"receipt": {"executed": true, "success": true}});
        match transaction_executed(RpcResponse::from_result(done)) {
            PollOutcome::Ready(info) => assert!(!info.receipt.failed()),
            other => panic!("unexpected outcome {:?}", other),
        }

        let garbled = json!({"receipt": {"executed": true, "success": "yes"}});
        assert!(matches!(
            transaction_executed(RpcResponse::from_result(garbled)),
            PollOutcome::Errored(_)
        ));
    }

    #[test]
    fn fee_token_classification() {
        assert_eq!(
            fee_token_ready(RpcResponse::from_result(json!({}))),
            PollOutcome::NotReady
        );
        assert!(matches!(
            fee_token_ready(RpcResponse::from_result(json!({"1": {"5": "1000"}}))),
            PollOutcome::Errored(_)
        ));
        assert_eq!(
            fee_token_ready(RpcResponse::from_result(json!({"0": {}}))),
            PollOutcome::NotReady
        );
        assert_eq!(
            fee_token_ready(RpcResponse::from_result(json!({"0": {"17": "1", "5": "1000"}}))),
            PollOutcome::Ready(5)
        );
    }
}
