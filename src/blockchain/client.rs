//! JSON-RPC wallet provider with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the configured JSON-RPC endpoint
//! - Sign outgoing transactions with the local key
//! - Query chain state (chain id, block number, receipts, `eth_call`)
//! - Turn timeouts and transport failures into [`ProviderError`]s

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::TransportResult;
use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::timeout;

use crate::blockchain::provider::{ProviderEvent, WalletProvider};
use crate::blockchain::types::{NetworkConfig, ProviderError, ProviderResult, TxReceipt};
use crate::blockchain::wallet::Wallet;

/// Wallet provider backed by a JSON-RPC node and a local signing key.
///
/// The HTTP transport has no push channel, so [`WalletProvider::subscribe`]
/// only ever yields events sent through [`RpcWalletProvider::notify`].
pub struct RpcWalletProvider {
    provider: Arc<dyn Provider + Send + Sync>,
    wallet: Wallet,
    config: NetworkConfig,
    timeout_duration: Duration,
    events: broadcast::Sender<ProviderEvent>,
}

impl RpcWalletProvider {
    /// Create a provider for `config.rpc_url` signing with `wallet`.
    ///
    /// No request is made here; an unreachable node shows up on first use.
    pub fn new(config: NetworkConfig, wallet: Wallet) -> ProviderResult<Self> {
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            ProviderError::Network(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.to_ethereum_wallet())
            .connect_http(url);
        let (events, _) = broadcast::channel(16);

        tracing::info!(
            rpc_url = %config.rpc_url,
            chain_id = config.chain_id,
            address = %wallet.address(),
            "RPC wallet provider initialized"
        );

        Ok(Self {
            provider: Arc::new(provider) as Arc<dyn Provider + Send + Sync>,
            wallet,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
            events,
        })
    }

    /// Look for a wallet in the environment.
    ///
    /// Returns `Ok(None)` when no signing key is configured, which the
    /// connector reports as `ProviderUnavailable`.
    pub fn discover(config: &NetworkConfig) -> ProviderResult<Option<Arc<dyn WalletProvider>>> {
        match Wallet::from_env(config.chain_id)? {
            Some(wallet) => {
                let provider = Self::new(config.clone(), wallet)?;
                Ok(Some(Arc::new(provider) as Arc<dyn WalletProvider>))
            }
            None => {
                tracing::warn!("No wallet key in environment, provider unavailable");
                Ok(None)
            }
        }
    }

    /// Push an event to subscribers.
    pub fn notify(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// Address of the local signing key.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Get the network configuration.
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    async fn with_timeout<T, F>(&self, op: &'static str, fut: F) -> ProviderResult<T>
    where
        F: IntoFuture<Output = TransportResult<T>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(op = op, error = %e, "RPC error");
                Err(e.into())
            }
            Err(_) => {
                tracing::warn!(op = op, "RPC timeout");
                Err(ProviderError::Network(format!(
                    "{} timed out after {} seconds",
                    op, self.config.rpc_timeout_secs
                )))
            }
        }
    }
}

#[async_trait]
impl WalletProvider for RpcWalletProvider {
    async fn request_accounts(&self) -> ProviderResult<Vec<Address>> {
        // A local key authorizes itself.
        Ok(vec![self.wallet.address()])
    }

    async fn chain_id(&self) -> ProviderResult<u64> {
        self.with_timeout("eth_chainId", self.provider.get_chain_id())
            .await
    }

    async fn call(&self, request: TransactionRequest) -> ProviderResult<Bytes> {
        let request = if request.from.is_none() {
            request.with_from(self.wallet.address())
        } else {
            request
        };
        self.with_timeout("eth_call", self.provider.call(request))
            .await
    }

    async fn send_transaction(&self, request: TransactionRequest) -> ProviderResult<TxHash> {
        match timeout(self.timeout_duration, self.provider.send_transaction(request)).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => {
                tracing::warn!(op = "eth_sendTransaction", error = %e, "RPC error");
                Err(e.into())
            }
            Err(_) => {
                // The node may have accepted the transaction before the deadline.
                tracing::warn!(op = "eth_sendTransaction", "RPC timeout, broadcast outcome unknown");
                Err(ProviderError::Network(format!(
                    "eth_sendTransaction timed out after {} seconds; the transaction may \
                     already be in flight, check the account nonce before resubmitting",
                    self.config.rpc_timeout_secs
                )))
            }
        }
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> ProviderResult<Option<TxReceipt>> {
        let receipt = self
            .with_timeout(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(tx_hash),
            )
            .await?;

        Ok(receipt.map(|r| TxReceipt {
            tx_hash: r.transaction_hash,
            block_number: r.block_number.unwrap_or_default(),
            success: r.status(),
        }))
    }

    async fn block_number(&self) -> ProviderResult<u64> {
        self.with_timeout("eth_blockNumber", self.provider.get_block_number())
            .await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

impl std::fmt::Debug for RpcWalletProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcWalletProvider")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("address", &self.wallet.address())
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
