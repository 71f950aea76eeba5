//! User actions against the GetSet contract.
//!
//! Each action checks its preconditions, delegates to the connector,
//! binding, and coordinator, and mirrors the outcome into [`ViewState`].
//! Errors are returned unchanged to the caller and also surfaced as an
//! error notification; state fields keep their last confirmed values.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::blockchain::provider::ProviderEvent;
use crate::blockchain::transaction::{Confirmed, TransactionCoordinator, WriteCall};
use crate::contract::units::{format_amount, parse_amount};
use crate::contract::{ContractBindingHandle, ContractDescriptor};
use crate::error::{SessionError, SessionResult};
use crate::session::WalletConnector;
use crate::view::state::{Notification, SessionStatus, ViewState};

struct Inner {
    connector: WalletConnector,
    descriptor: Arc<ContractDescriptor>,
    coordinator: TransactionCoordinator,
    binding: Mutex<Option<ContractBindingHandle>>,
    state: watch::Sender<ViewState>,
}

/// Orchestrates the wallet session for the UI. Cheap to clone.
#[derive(Clone)]
pub struct ViewController {
    inner: Arc<Inner>,
}

impl ViewController {
    /// Create a controller for `descriptor`.
    pub fn new(
        connector: WalletConnector,
        descriptor: Arc<ContractDescriptor>,
        coordinator: TransactionCoordinator,
    ) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            inner: Arc::new(Inner {
                connector,
                descriptor,
                coordinator,
                binding: Mutex::new(None),
                state,
            }),
        }
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.inner.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ViewState {
        self.inner.state.borrow().clone()
    }

    fn is_ended(&self) -> bool {
        self.inner.state.borrow().session == SessionStatus::Ended
    }

    fn binding_slot(&self) -> MutexGuard<'_, Option<ContractBindingHandle>> {
        self.inner.binding.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The live binding, or why there is none.
    fn bound(&self) -> SessionResult<ContractBindingHandle> {
        if self.is_ended() {
            return Err(SessionError::ProviderUnavailable);
        }
        let mut slot = self.binding_slot();
        match slot.as_ref() {
            Some(handle) if handle.is_valid() => Ok(handle.clone()),
            Some(_) => {
                *slot = None;
                Err(SessionError::NotConnected)
            }
            None => Err(SessionError::NotConnected),
        }
    }

    /// Surface a failure to the user. `ProviderUnavailable` ends the session.
    fn report<T>(&self, action: &'static str, result: SessionResult<T>) -> SessionResult<T> {
        if let Err(err) = &result {
            tracing::warn!(action = action, error = %err, "Action failed");
            if err.is_fatal() {
                self.binding_slot().take();
            }
            let message = format!("{} failed: {}", action, err);
            self.inner.state.send_modify(|state| {
                if err.is_fatal() {
                    state.session = SessionStatus::Ended;
                    state.account = None;
                    state.balance = None;
                    state.pending_tx = None;
                }
                state.notification = Some(Notification::error(message));
            });
        }
        result
    }

    fn notify(&self, message: String) {
        self.inner.state.send_modify(|state| {
            state.notification = Some(Notification::info(message));
        });
    }

    /// Connect the wallet and bind the contract.
    pub async fn connect_wallet(&self) -> SessionResult<Address> {
        let result = self.connect_and_bind().await;
        let result = self.report("Connect wallet", result);
        let address = result?;
        self.notify(format!("Connected: {}", address));
        Ok(address)
    }

    async fn connect_and_bind(&self) -> SessionResult<Address> {
        if self.is_ended() {
            return Err(SessionError::ProviderUnavailable);
        }

        let identity = self.inner.connector.connect().await?;
        let address = identity.address();
        let handle = ContractBindingHandle::bind(self.inner.descriptor.clone(), identity)?;
        *self.binding_slot() = Some(handle);

        self.inner.state.send_modify(|state| {
            if state.account != Some(address) {
                state.balance = None;
            }
            state.session = SessionStatus::Connected;
            state.account = Some(address);
        });
        Ok(address)
    }

    /// Drop the identity and every account-scoped field.
    pub async fn disconnect(&self) {
        self.inner.connector.disconnect().await;
        self.clear_session("Wallet disconnected");
    }

    fn clear_session(&self, message: &str) {
        self.binding_slot().take();
        self.inner.state.send_modify(|state| {
            if state.session != SessionStatus::Ended {
                state.session = SessionStatus::Disconnected;
            }
            state.account = None;
            state.balance = None;
            state.notification = Some(Notification::info(message));
        });
    }

    /// Store `value` in the contract and wait for confirmation.
    ///
    /// `value` must be a non-negative integer that fits in 256 bits.
    pub async fn set_value(&self, value: &str) -> SessionResult<Confirmed> {
        let result = self.try_set_value(value).await;
        let confirmed = self.report("Set value", result)?;
        self.notify("Value set successfully!".to_string());
        Ok(confirmed)
    }

    async fn try_set_value(&self, value: &str) -> SessionResult<Confirmed> {
        let handle = self.bound()?;
        let raw = value.trim();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SessionError::InvalidInput(format!(
                "'{}' is not a non-negative integer",
                value
            )));
        }

        let args = handle.schema().method("set")?.parse_args(&[raw])?;
        let display = match args.first().and_then(DynSolValue::as_uint) {
            Some((number, _)) => number.to_string(),
            None => raw.to_string(),
        };
        let call = handle.send("set", &args, U256::ZERO)?;
        self.track_write(call, Some(display)).await
    }

    /// Read the stored value.
    pub async fn get_value(&self) -> SessionResult<String> {
        let result = self.try_get_value().await;
        self.report("Get value", result)
    }

    async fn try_get_value(&self) -> SessionResult<String> {
        let handle = self.bound()?;
        let values = handle.call("get", &[]).await?;
        let value = first_uint(&values, "get")?.to_string();

        self.inner.state.send_modify(|state| {
            state.stored_value = Some(value.clone());
        });
        Ok(value)
    }

    /// Send `amount` ether to the contract and wait for confirmation.
    pub async fn deposit_funds(&self, amount: &str) -> SessionResult<Confirmed> {
        let result = self.try_deposit(amount).await;
        let confirmed = self.report("Deposit", result)?;
        self.notify(format!("Deposited {} ETH successfully!", amount.trim()));
        Ok(confirmed)
    }

    async fn try_deposit(&self, amount: &str) -> SessionResult<Confirmed> {
        let handle = self.bound()?;
        let wei = parse_amount(amount)?;
        let call = handle.transfer(wei)?;
        self.track_write(call, None).await
    }

    /// Read the connected account's deposited balance, in ether.
    pub async fn get_balance(&self) -> SessionResult<String> {
        let result = self.try_get_balance().await;
        self.report("Get balance", result)
    }

    async fn try_get_balance(&self) -> SessionResult<String> {
        let handle = self.bound()?;
        let account = handle.identity().address();
        let values = handle
            .call("getBalance", &[DynSolValue::Address(account)])
            .await?;
        let balance = format_amount(first_uint(&values, "getBalance")?);

        self.inner.state.send_modify(|state| {
            if state.account == Some(account) {
                state.balance = Some(balance.clone());
            }
        });
        Ok(balance)
    }

    /// Submit, show the pending transaction, wait, and settle the state.
    ///
    /// `optimistic` is shown as the stored value once the transaction is
    /// broadcast, and is the stored value again on confirmation. If the
    /// transaction fails, the previous value comes back unless something
    /// newer was shown in between.
    async fn track_write(&self, call: WriteCall, optimistic: Option<String>) -> SessionResult<Confirmed> {
        let pending = self.inner.coordinator.submit(call).await?;
        let tx_hash = pending.tx_hash();

        let mut previous = None;
        self.inner.state.send_modify(|state| {
            state.pending_tx = Some(tx_hash);
            if let Some(value) = &optimistic {
                previous = state.stored_value.replace(value.clone());
            }
        });

        let result = self.inner.coordinator.await_confirmation(pending).await;

        self.inner.state.send_modify(|state| {
            if state.pending_tx == Some(tx_hash) {
                state.pending_tx = None;
            }
            if optimistic.is_some() {
                match &result {
                    Ok(_) => state.stored_value = optimistic,
                    // A read may have replaced the optimistic value meanwhile.
                    Err(_) if state.stored_value == optimistic => state.stored_value = previous,
                    Err(_) => {}
                }
            }
        });
        result
    }

    /// Re-derive the session after a provider event.
    pub async fn handle_provider_event(&self, event: ProviderEvent) {
        self.inner.connector.handle_event(&event).await;

        match &event {
            ProviderEvent::Disconnected => self.clear_session("Wallet disconnected"),
            ProviderEvent::AccountsChanged(accounts) if accounts.is_empty() => {
                self.clear_session("Wallet disconnected")
            }
            _ => {
                let still_bound = self.binding_slot().as_ref().is_some_and(|h| h.is_valid());
                let was_connected = self.state().session == SessionStatus::Connected;
                if !still_bound && was_connected {
                    tracing::info!(event = ?event, "Re-deriving signing identity");
                    self.clear_session("Wallet changed, reconnecting");
                    let _ = self.connect_wallet().await;
                }
            }
        }
    }

    /// Forward provider events to [`ViewController::handle_provider_event`]
    /// on a background task. `None` without a provider.
    pub fn watch_provider_events(&self) -> Option<JoinHandle<()>> {
        let mut events = self.inner.connector.subscribe()?;
        let controller = self.clone();

        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => controller.handle_provider_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped = skipped, "Provider events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }))
    }
}

fn first_uint(values: &[DynSolValue], method: &str) -> SessionResult<U256> {
    values
        .first()
        .and_then(DynSolValue::as_uint)
        .map(|(value, _)| value)
        .ok_or_else(|| SessionError::CallFailed(format!("{} did not return a uint", method)))
}

impl std::fmt::Debug for ViewController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewController")
            .field("contract", &self.inner.descriptor.address())
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}
