//! Account activation.
//!
//! Walks a single account from lookup to an executed ChangePubKey transaction:
//!
//! ```text
//! Start -> AccountFetched -> SigningKeyChecked -> AlreadyActive
//!                                              -> FeeTokenResolved -> ChainIdResolved
//!       -> Signed -> Submitted -> ReceiptAwaited -> Success | Failure
//! ```
//!
//! Every network call is awaited before the next one is issued.

use crate::poller::{
    account_ready, fee_token_ready, poll_until, transaction_executed, DEFAULT_POLL_INTERVAL,
};
use crate::rpc::{RpcTransport, TransportError};
use crate::types::{AccountState, TransactionInfo};
use crate::wallet::{ChangePubKeyParams, EthAuthType, L2Wallet, WalletError};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Activation fee. ChangePubKey is free on zkLink.
pub const ACTIVATION_FEE: &str = "0";

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("unexpected {method} response: {reason}")]
    UnexpectedResponse { method: &'static str, reason: String },

    #[error("confirmation prompt failed: {0}")]
    Prompt(String),
}

/// Asks the operator before anything is signed.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> Result<bool, ActivationError>;
}

/// Non-interactive runs (`--yes`).
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeYes;

impl Confirmation for AssumeYes {
    fn confirm(&self, _prompt: &str) -> Result<bool, ActivationError> {
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Start,
    AccountFetched,
    SigningKeyChecked,
    AlreadyActive,
    FeeTokenResolving,
    FeeTokenResolved,
    ChainIdResolved,
    Signed,
    Submitted,
    ReceiptAwaited,
    Success,
    Failure,
}

impl fmt::Display for ActivationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActivationState::Start => "start",
            ActivationState::AccountFetched => "account fetched",
            ActivationState::SigningKeyChecked => "signing key checked",
            ActivationState::AlreadyActive => "already active",
            ActivationState::FeeTokenResolving => "resolving fee token",
            ActivationState::FeeTokenResolved => "fee token resolved",
            ActivationState::ChainIdResolved => "chain id resolved",
            ActivationState::Signed => "signed",
            ActivationState::Submitted => "submitted",
            ActivationState::ReceiptAwaited => "receipt awaited",
            ActivationState::Success => "success",
            ActivationState::Failure => "failure",
        };
        f.write_str(name)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    /// A signing key was already registered; nothing was signed.
    AlreadyActive { account: AccountState },
    /// The operator declined the prompt.
    Declined,
    /// The transaction executed; `pub_key_hash` is read back from the account.
    Activated { tx_hash: String, pub_key_hash: String },
    /// `sendTransaction` answered with an error.
    SubmissionRejected { message: String },
    /// The transaction executed with `success: false`.
    ExecutionFailed { tx_hash: String, reason: String },
}

impl ActivationOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            ActivationOutcome::AlreadyActive { .. }
            | ActivationOutcome::Declined
            | ActivationOutcome::Activated { .. } => 0,
            ActivationOutcome::SubmissionRejected { .. }
            | ActivationOutcome::ExecutionFailed { .. } => 1,
        }
    }
}

pub struct Activator<'a, R: ?Sized, W: ?Sized> {
    rpc: &'a R,
    wallet: &'a W,
    confirmation: &'a dyn Confirmation,
    poll_interval: Duration,
}

impl<'a, R, W> Activator<'a, R, W>
where
    R: RpcTransport + ?Sized,
    W: L2Wallet + ?Sized,
{
    pub fn new(rpc: &'a R, wallet: &'a W, confirmation: &'a dyn Confirmation) -> Self {
        Self {
            rpc,
            wallet,
            confirmation,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn enter(&self, state: ActivationState) {
        log::debug!("activation: {}", state);
    }

    pub async fn run(&self) -> Result<ActivationOutcome, ActivationError> {
        self.enter(ActivationState::Start);
        let address = self.wallet.address();

        let account = self.wait_for_account(address).await?;
        self.enter(ActivationState::AccountFetched);
        log::info!(
            "account {} found (nonce {}, pubkey hash {})",
            account.id,
            account.nonce,
            account.pub_key_hash
        );

        let key_set = self
            .wallet
            .is_signing_key_set(&account.pub_key_hash)
            .await?;
        self.enter(ActivationState::SigningKeyChecked);
        if key_set {
            self.enter(ActivationState::AlreadyActive);
            return Ok(ActivationOutcome::AlreadyActive { account });
        }

        if !self.confirmation.confirm("Activate account now?")? {
            return Ok(ActivationOutcome::Declined);
        }

        self.enter(ActivationState::FeeTokenResolving);
        let fee_token_id = self.wait_for_fee_token(account.id).await?;
        self.enter(ActivationState::FeeTokenResolved);
        log::info!("paying activation fee with token {}", fee_token_id);

        let chain_id = self.fetch_chain_id().await?;
        self.enter(ActivationState::ChainIdResolved);

        let params = ChangePubKeyParams {
            account_id: account.id,
            sub_account_id: 0,
            chain_id,
            eth_auth_type: EthAuthType::EthEcdsa,
            fee_token_id,
            fee: ACTIVATION_FEE.to_string(),
            nonce: account.nonce,
        };
        let signed = self.wallet.sign_change_pub_key(&params).await?;
        self.enter(ActivationState::Signed);

        let response = self.rpc.send_transaction(signed.tx).await?;
        if let Some(error) = response.error {
            self.enter(ActivationState::Failure);
            return Ok(ActivationOutcome::SubmissionRejected {
                message: error.message,
            });
        }
        let tx_hash = match response.result {
            Some(Value::String(hash)) => hash,
            Some(other) => other.to_string(),
            None => {
                return Err(ActivationError::UnexpectedResponse {
                    method: "sendTransaction",
                    reason: "neither result nor error".to_string(),
                })
            }
        };
        self.enter(ActivationState::Submitted);
        log::info!("transaction sent, tx hash: {}", tx_hash);

        let info = self.wait_for_execution(&tx_hash).await?;
        self.enter(ActivationState::ReceiptAwaited);
        if info.receipt.failed() {
            self.enter(ActivationState::Failure);
            return Ok(ActivationOutcome::ExecutionFailed {
                tx_hash,
                reason: info.receipt.fail_reason.unwrap_or_default(),
            });
        }

        let pub_key_hash = self.fetch_pub_key_hash(address).await?;
        self.enter(ActivationState::Success);
        Ok(ActivationOutcome::Activated {
            tx_hash,
            pub_key_hash,
        })
    }

    async fn wait_for_account(&self, address: &str) -> Result<AccountState, ActivationError> {
        let rpc = self.rpc;
        let account = poll_until(self.poll_interval, move || async move {
            rpc.get_account(address).await.map(account_ready)
        })
        .await?;
        Ok(account)
    }

    async fn wait_for_fee_token(&self, account_id: u64) -> Result<u32, ActivationError> {
        let rpc = self.rpc;
        let token_id = poll_until(self.poll_interval, move || async move {
            rpc.get_account_balances(account_id)
                .await
                .map(fee_token_ready)
        })
        .await?;
        Ok(token_id)
    }

    /// One attempt, no retry. On error the chain id stays unknown and signing
    /// proceeds without it.
    async fn fetch_chain_id(&self) -> Result<Option<u64>, ActivationError> {
        let response = self.rpc.get_change_pubkey_chain_id().await?;
        if let Some(message) = response.error_message() {
            log::warn!("[ERROR] {}", message);
        }
        let chain_id = response.result.as_ref().and_then(Value::as_u64);
        if chain_id.is_none() {
            log::warn!("change pubkey chain id unknown, signing without it");
        }
        Ok(chain_id)
    }

    async fn wait_for_execution(&self, tx_hash: &str) -> Result<TransactionInfo, ActivationError> {
        let rpc = self.rpc;
        let info = poll_until(self.poll_interval, move || async move {
            rpc.get_transaction_by_hash(tx_hash)
                .await
                .map(transaction_executed)
        })
        .await?;
        Ok(info)
    }

    async fn fetch_pub_key_hash(&self, address: &str) -> Result<String, ActivationError> {
        let response = self.rpc.get_account(address).await?;
        response
            .result
            .as_ref()
            .and_then(|r| r.get("pubKeyHash"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ActivationError::UnexpectedResponse {
                method: "getAccount",
                reason: response
                    .error_message()
                    .unwrap_or("no pubKeyHash in result")
                    .to_string(),
            })
    }
}
