//! Wallet provider boundary.
//!
//! A wallet provider is the injected, user-mediated object that grants
//! account access, signs and broadcasts transactions, and relays node
//! queries. The session never reaches for one implicitly: a provider is
//! handed to [`WalletConnector`](crate::session::WalletConnector) at
//! construction, so tests and demos substitute a simulated one.

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::blockchain::types::{ProviderResult, TxReceipt};

/// Notifications pushed by the provider outside of any request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The authorized account list changed. Empty means the user disconnected
    /// every account.
    AccountsChanged(Vec<Address>),
    /// The wallet switched networks.
    ChainChanged(u64),
    /// The provider lost its connection to every chain.
    Disconnected,
}

/// Asynchronous interface to an injected wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask for account access. May prompt the user.
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>>;

    /// Chain the wallet is currently connected to.
    async fn chain_id(&self) -> ProviderResult<u64>;

    /// Execute a read-only call against the latest state.
    async fn call(&self, request: TransactionRequest) -> ProviderResult<Bytes>;

    /// Sign and broadcast a transaction. May prompt the user.
    async fn send_transaction(&self, request: TransactionRequest) -> ProviderResult<TxHash>;

    /// Receipt of a mined transaction, `None` while still pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> ProviderResult<Option<TxReceipt>>;

    /// Latest block number.
    async fn block_number(&self) -> ProviderResult<u64>;

    /// Subscribe to provider events.
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}
