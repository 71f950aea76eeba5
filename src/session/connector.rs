//! Wallet connection and identity lifecycle.
//!
//! # State Transitions
//! ```text
//! Disconnected → Connected: connect() authorized by the user
//! Connected → Disconnected: disconnect(), AccountsChanged, ChainChanged, Disconnected
//! ```
//!
//! At most one identity is live at a time. Concurrent `connect()` calls are
//! serialized, so the user never sees two account prompts at once.

use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::Address;
use tokio::sync::{broadcast, Mutex};

use crate::blockchain::provider::{ProviderEvent, WalletProvider};
use crate::error::{SessionError, SessionResult};
use crate::observability::metrics;
use crate::session::identity::{AccountSlot, SigningIdentity};

/// Owns the session's signing identity.
pub struct WalletConnector {
    provider: Option<Arc<dyn WalletProvider>>,
    expected_chain_id: u64,
    current: Mutex<Option<SigningIdentity>>,
    write_slots: std::sync::Mutex<HashMap<Address, AccountSlot>>,
}

impl WalletConnector {
    /// Create a connector. `None` means no provider was found in the
    /// environment; every `connect()` then fails with `ProviderUnavailable`.
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, expected_chain_id: u64) -> Self {
        Self {
            provider,
            expected_chain_id,
            current: Mutex::new(None),
            write_slots: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Whether a provider was injected.
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Connect, or return the live identity if already connected.
    pub async fn connect(&self) -> SessionResult<SigningIdentity> {
        let mut current = self.current.lock().await;

        if let Some(identity) = current.as_ref() {
            if identity.is_active() {
                return Ok(identity.clone());
            }
        }
        *current = None;

        let provider = match &self.provider {
            Some(provider) => provider.clone(),
            None => {
                metrics::record_connection("unavailable");
                return Err(SessionError::ProviderUnavailable);
            }
        };

        let result = self.authorize(provider).await;
        match &result {
            Ok(identity) => {
                metrics::record_connection("connected");
                tracing::info!(
                    address = %identity.address(),
                    chain_id = identity.chain_id(),
                    "Wallet connected"
                );
                *current = Some(identity.clone());
            }
            Err(e) => {
                metrics::record_connection("failed");
                tracing::warn!(error = %e, "Wallet connection failed");
            }
        }
        result
    }

    async fn authorize(&self, provider: Arc<dyn WalletProvider>) -> SessionResult<SigningIdentity> {
        let accounts = provider
            .request_accounts()
            .await
            .map_err(SessionError::from_connect)?;
        let address = accounts
            .first()
            .copied()
            .ok_or(SessionError::UserRejected)?;

        let chain_id = provider
            .chain_id()
            .await
            .map_err(SessionError::from_connect)?;
        if chain_id != self.expected_chain_id {
            return Err(SessionError::ChainMismatch {
                expected: self.expected_chain_id,
                actual: chain_id,
            });
        }

        Ok(SigningIdentity::new(
            address,
            chain_id,
            provider,
            self.write_slot(address),
        ))
    }

    /// The write slot for `address`, created on first use and kept for the
    /// connector's lifetime.
    fn write_slot(&self, address: Address) -> AccountSlot {
        self.write_slots
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(address)
            .or_default()
            .clone()
    }

    /// The live identity, if any.
    pub async fn current(&self) -> Option<SigningIdentity> {
        self.current
            .lock()
            .await
            .as_ref()
            .filter(|identity| identity.is_active())
            .cloned()
    }

    /// Revoke the live identity.
    pub async fn disconnect(&self) {
        if let Some(identity) = self.current.lock().await.take() {
            identity.revoke();
        }
    }

    /// Subscribe to provider events. `None` without a provider.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<ProviderEvent>> {
        self.provider.as_ref().map(|provider| provider.subscribe())
    }

    /// React to a provider event.
    ///
    /// Any account, chain, or connectivity change invalidates the live
    /// identity; the caller re-derives a new one through `connect()`.
    /// An `AccountsChanged` that keeps the same first account is ignored.
    pub async fn handle_event(&self, event: &ProviderEvent) {
        let mut current = self.current.lock().await;
        let Some(identity) = current.as_ref() else {
            return;
        };

        let invalidate = match event {
            ProviderEvent::AccountsChanged(accounts) => {
                accounts.first() != Some(&identity.address())
            }
            ProviderEvent::ChainChanged(chain_id) => *chain_id != identity.chain_id(),
            ProviderEvent::Disconnected => true,
        };

        if invalidate {
            tracing::info!(event = ?event, "Provider event invalidates signing identity");
            if let Some(identity) = current.take() {
                identity.revoke();
            }
        }
    }
}

impl std::fmt::Debug for WalletConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConnector")
            .field("has_provider", &self.provider.is_some())
            .field("expected_chain_id", &self.expected_chain_id)
            .finish()
    }
}
