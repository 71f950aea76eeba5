//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! provider.rs (WalletProvider trait, ProviderEvent)
//!     ← client.rs (JSON-RPC node + local key from the environment)
//!     ← simulated.rs (in-memory chain with user prompts)
//! transaction.rs (submit, poll receipt, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod provider;
pub mod simulated;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::RpcWalletProvider;
pub use provider::{ProviderEvent, WalletProvider};
pub use simulated::SimulatedWallet;
pub use transaction::{ConfirmationPolicy, Confirmed, PendingTransaction, TransactionCoordinator, TxState, WriteCall};
pub use types::{ProviderError, ProviderResult, TxReceipt};
pub use wallet::Wallet;
