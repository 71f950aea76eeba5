//! Transaction submission and confirmation monitoring.
//!
//! # State Machine
//! ```text
//! submit() ──▶ Submitted ──await_confirmation()──▶ Confirmed
//!                                             └──▶ Failed(reason)
//! ```
//!
//! A `PendingTransaction` is consumed by `await_confirmation`, so it reaches
//! exactly one terminal state and cannot be awaited twice. Nothing is ever
//! resubmitted automatically: a failed write needs a new user action.
//!
//! While a transaction is pending it holds its identity's write slot; a
//! second `submit` for the same identity fails with `OperationInProgress`.

use std::time::{Duration, Instant, SystemTime};

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::provider::WalletProvider;
use crate::blockchain::types::NetworkConfig;
use crate::error::{SessionError, SessionResult};
use crate::observability::metrics;
use crate::session::{SigningIdentity, WriteSlot};

/// A state-changing call ready to be signed and broadcast.
#[derive(Debug, Clone)]
pub struct WriteCall {
    identity: SigningIdentity,
    to: Address,
    value: U256,
    input: Bytes,
    label: String,
}

impl WriteCall {
    pub(crate) fn new(
        identity: SigningIdentity,
        to: Address,
        value: U256,
        input: Bytes,
        label: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            to,
            value,
            input,
            label: label.into(),
        }
    }

    /// Identity that will sign.
    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Destination address.
    pub fn to(&self) -> Address {
        self.to
    }

    /// Native value attached, in wei.
    pub fn value(&self) -> U256 {
        self.value
    }

    /// ABI-encoded call data (empty for plain transfers).
    pub fn input(&self) -> &Bytes {
        &self.input
    }

    /// Method signature, or `transfer` for plain value transfers.
    pub fn label(&self) -> &str {
        &self.label
    }

    fn to_request(&self) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(self.identity.address())
            .with_to(self.to)
            .with_value(self.value)
            .with_input(self.input.clone())
    }
}

/// Lifecycle state of a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxState {
    /// Broadcast, awaiting inclusion.
    Submitted,
    /// Included with the required block depth.
    Confirmed { block_number: u64 },
    /// Reverted, or not confirmed before the deadline.
    Failed(String),
}

/// A broadcast transaction that has not been awaited yet.
#[derive(Debug)]
pub struct PendingTransaction {
    tx_hash: TxHash,
    submitted_at: SystemTime,
    started: Instant,
    state: TxState,
    label: String,
    identity: SigningIdentity,
    _slot: WriteSlot,
}

impl PendingTransaction {
    /// Transaction hash.
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Wall-clock submission time.
    pub fn submitted_at(&self) -> SystemTime {
        self.submitted_at
    }

    /// Current state; always `Submitted` until awaited.
    pub fn state(&self) -> &TxState {
        &self.state
    }

    /// What was called.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Terminal success of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmed {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub label: String,
}

/// When a transaction counts as confirmed, and how long to wait for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationPolicy {
    /// Blocks on top of the inclusion block.
    pub confirmations: u32,
    /// Receipt polling interval.
    pub poll_interval: Duration,
    /// Deadline after which the transaction is reported failed.
    pub timeout: Duration,
}

impl From<&NetworkConfig> for ConfirmationPolicy {
    fn from(config: &NetworkConfig) -> Self {
        Self {
            confirmations: config.confirmation_blocks,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            timeout: Duration::from_secs(config.confirmation_timeout_secs),
        }
    }
}

/// Submits writes and waits for their terminal state.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    policy: ConfirmationPolicy,
}

impl TransactionCoordinator {
    /// Create a coordinator with the given confirmation policy.
    pub fn new(policy: ConfirmationPolicy) -> Self {
        Self { policy }
    }

    /// The confirmation policy.
    pub fn policy(&self) -> &ConfirmationPolicy {
        &self.policy
    }

    /// Sign and broadcast `call`.
    pub async fn submit(&self, call: WriteCall) -> SessionResult<PendingTransaction> {
        call.identity.ensure_active()?;
        let slot = call.identity.try_acquire_write_slot()?;

        let request = call.to_request();
        let tx_hash = match call.identity.provider().send_transaction(request).await {
            Ok(hash) => hash,
            Err(e) => {
                let err = SessionError::from_submit(e);
                metrics::record_tx_failed("submit", None);
                tracing::warn!(
                    call = %call.label,
                    from = %call.identity.address(),
                    error = %err,
                    "Transaction submission failed"
                );
                return Err(err);
            }
        };

        metrics::record_tx_submitted(if call.input.is_empty() { "transfer" } else { "call" });
        tracing::info!(
            tx_hash = %tx_hash,
            call = %call.label,
            from = %call.identity.address(),
            to = %call.to,
            value = %call.value,
            "Transaction submitted"
        );

        Ok(PendingTransaction {
            tx_hash,
            submitted_at: SystemTime::now(),
            started: Instant::now(),
            state: TxState::Submitted,
            label: call.label,
            identity: call.identity,
            _slot: slot,
        })
    }

    /// Wait until `tx` is confirmed or has definitively failed.
    ///
    /// Only `Confirmed` or `TxFailed` come out of here. Errors while polling
    /// are treated as transient until the deadline passes.
    pub async fn await_confirmation(&self, mut tx: PendingTransaction) -> SessionResult<Confirmed> {
        let provider = tx.identity.provider().clone();
        let outcome = match timeout(self.policy.timeout, self.poll(provider.as_ref(), tx.tx_hash)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(format!(
                "not confirmed within {} seconds",
                self.policy.timeout.as_secs_f64()
            )),
        };
        let elapsed = tx.started.elapsed();

        match outcome {
            Ok(block_number) => {
                tx.state = TxState::Confirmed { block_number };
                metrics::record_tx_confirmed(elapsed);
                tracing::info!(
                    tx_hash = %tx.tx_hash,
                    call = %tx.label,
                    block_number = block_number,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Transaction confirmed"
                );
                Ok(Confirmed {
                    tx_hash: tx.tx_hash,
                    block_number,
                    label: std::mem::take(&mut tx.label),
                })
            }
            Err(reason) => {
                tx.state = TxState::Failed(reason.clone());
                metrics::record_tx_failed("confirm", Some(elapsed));
                tracing::warn!(
                    tx_hash = %tx.tx_hash,
                    call = %tx.label,
                    reason = %reason,
                    "Transaction failed"
                );
                Err(SessionError::TxFailed(reason))
            }
        }
    }

    /// Submit `call` and wait for its terminal state.
    pub async fn execute(&self, call: WriteCall) -> SessionResult<Confirmed> {
        let pending = self.submit(call).await?;
        self.await_confirmation(pending).await
    }

    async fn poll(&self, provider: &dyn WalletProvider, tx_hash: TxHash) -> Result<u64, String> {
        let required = u64::from(self.policy.confirmations);
        let mut ticker = interval(self.policy.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let receipt = match provider.transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => receipt,
                Ok(None) => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Receipt poll failed");
                    continue;
                }
            };

            if !receipt.success {
                return Err("transaction reverted".to_string());
            }
            if required == 0 {
                return Ok(receipt.block_number);
            }

            let current_block = match provider.block_number().await {
                Ok(block) => block,
                Err(e) => {
                    tracing::warn!(tx_hash = %tx_hash, error = %e, "Block number poll failed");
                    continue;
                }
            };
            let confirmations = current_block.saturating_sub(receipt.block_number);
            if confirmations >= required {
                return Ok(receipt.block_number);
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                confirmations = confirmations,
                required = required,
                "Waiting for confirmations"
            );
        }
    }
}
