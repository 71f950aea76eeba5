//! Observable UI state.

use alloy::primitives::{Address, TxHash};
use serde::Serialize;

/// Where the wallet session stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// No live identity; `connect_wallet` may be tried.
    #[default]
    Disconnected,
    /// A signing identity is bound to the contract.
    Connected,
    /// No provider exists. Terminal.
    Ended,
}

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A message for the user about the last action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Everything the UI renders.
///
/// Fields only change on a confirmed result, except `stored_value`, which
/// shows a broadcast `set` optimistically and reverts if it fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub session: SessionStatus,
    pub account: Option<Address>,
    /// Last known `get()` value, decimal.
    pub stored_value: Option<String>,
    /// Last known deposited balance of `account`, in ether.
    pub balance: Option<String>,
    /// Write currently awaiting confirmation.
    pub pending_tx: Option<TxHash>,
    pub notification: Option<Notification>,
}

impl ViewState {
    /// Whether a write is in flight.
    pub fn is_busy(&self) -> bool {
        self.pending_tx.is_some()
    }
}
