//! Chain-level types and provider error definitions.

use alloy::primitives::TxHash;
use alloy::transports::{RpcError, TransportError};
use thiserror::Error;

// Re-export NetworkConfig from config module to avoid duplication
pub use crate::config::schema::NetworkConfig;

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-1193 code for a provider that is disconnected from all chains.
pub const DISCONNECTED_CODE: i64 = 4900;

/// Errors reported by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The user declined the prompt.
    #[error("User rejected the request")]
    UserRejected,

    /// The provider is gone (uninstalled, locked out, disconnected).
    #[error("Provider unavailable")]
    Unavailable,

    /// The request did not reach the node.
    #[error("Network error: {0}")]
    Network(String),

    /// The configured signing key could not be parsed.
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    /// The node answered with a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
}

impl From<TransportError> for ProviderError {
    fn from(err: TransportError) -> Self {
        match &err {
            RpcError::Transport(kind) => ProviderError::Network(kind.to_string()),
            RpcError::ErrorResp(payload) => match payload.code {
                USER_REJECTED_CODE => ProviderError::UserRejected,
                DISCONNECTED_CODE => ProviderError::Unavailable,
                code => ProviderError::Rpc {
                    code,
                    message: payload.message.to_string(),
                },
            },
            _ => ProviderError::Rpc {
                code: 0,
                message: err.to_string(),
            },
        }
    }
}

/// Result type for provider calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// The parts of a transaction receipt the coordinator acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    /// Hash of the mined transaction.
    pub tx_hash: TxHash,
    /// Block the transaction was included in.
    pub block_number: u64,
    /// `false` when execution reverted.
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::json_rpc::ErrorPayload;

    #[test]
    fn test_user_rejection_code_is_recognized() {
        let payload = ErrorPayload {
            code: USER_REJECTED_CODE,
            message: "User denied transaction signature.".into(),
            data: None,
        };
        let err: ProviderError = TransportError::ErrorResp(payload).into();
        assert_eq!(err, ProviderError::UserRejected);
    }

    #[test]
    fn test_other_rpc_errors_keep_message() {
        let payload = ErrorPayload {
            code: -32000,
            message: "insufficient funds for gas * price + value".into(),
            data: None,
        };
        let err: ProviderError = TransportError::ErrorResp(payload).into();
        assert!(matches!(err, ProviderError::Rpc { code: -32000, .. }));
        assert!(err.to_string().contains("insufficient funds"));
    }

    #[test]
    fn test_invalid_key_is_not_an_rpc_error() {
        let err = ProviderError::InvalidKey("odd number of digits".into());
        assert_eq!(err.to_string(), "Invalid signing key: odd number of digits");
    }
}
