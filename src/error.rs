//! Session-level error taxonomy.
//!
//! Every failure raised by the connector, the contract binding, or the
//! transaction coordinator is one of these variants and reaches the
//! view controller unmodified.

use thiserror::Error;

use crate::blockchain::types::ProviderError;

/// Errors surfaced by the wallet session and transaction lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// No wallet provider is present. Ends the session.
    #[error("No wallet provider available")]
    ProviderUnavailable,

    /// The account-access prompt was declined.
    #[error("User rejected the account access request")]
    UserRejected,

    /// The contract descriptor could not be turned into a typed interface.
    #[error("Invalid contract descriptor: {0}")]
    InvalidDescriptor(String),

    /// The signer declined, or the node refused the transaction.
    #[error("Transaction submission rejected: {0}")]
    SubmissionRejected(String),

    /// The request could not reach the network.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The transaction reached a definitive failed state.
    #[error("Transaction failed: {0}")]
    TxFailed(String),

    /// Another write for the same identity is still pending.
    #[error("Another transaction is still pending")]
    OperationInProgress,

    /// No live signing identity (never connected, or revoked).
    #[error("Wallet not connected")]
    NotConnected,

    /// User input or call arguments do not match what is expected.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The wallet is on a different chain than configured.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// A read call was rejected by the node (e.g. reverted).
    #[error("Contract call failed: {0}")]
    CallFailed(String),

    /// Contract artifacts could not be read.
    #[error("Artifact error: {0}")]
    Artifact(String),
}

impl SessionError {
    /// Whether this error terminates the whole session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SessionError::ProviderUnavailable)
    }

    /// Map a provider failure raised while requesting accounts.
    pub(crate) fn from_connect(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected => SessionError::UserRejected,
            ProviderError::Unavailable | ProviderError::InvalidKey(_) => {
                SessionError::ProviderUnavailable
            }
            ProviderError::Network(msg) => SessionError::NetworkError(msg),
            ProviderError::Rpc { message, .. } => SessionError::NetworkError(message),
        }
    }

    /// Map a provider failure raised while sending a transaction.
    pub(crate) fn from_submit(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected => {
                SessionError::SubmissionRejected("user denied transaction signature".to_string())
            }
            ProviderError::Unavailable | ProviderError::InvalidKey(_) => {
                SessionError::ProviderUnavailable
            }
            ProviderError::Network(msg) => SessionError::NetworkError(msg),
            ProviderError::Rpc { message, .. } => SessionError::SubmissionRejected(message),
        }
    }

    /// Map a provider failure raised by a read call.
    pub(crate) fn from_read(err: ProviderError) -> Self {
        match err {
            ProviderError::UserRejected => SessionError::UserRejected,
            ProviderError::Unavailable | ProviderError::InvalidKey(_) => {
                SessionError::ProviderUnavailable
            }
            ProviderError::Network(msg) => SessionError::NetworkError(msg),
            ProviderError::Rpc { message, .. } => SessionError::CallFailed(message),
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_provider_unavailable_is_fatal() {
        assert!(SessionError::ProviderUnavailable.is_fatal());
        assert!(!SessionError::UserRejected.is_fatal());
        assert!(!SessionError::TxFailed("reverted".into()).is_fatal());
        assert!(!SessionError::OperationInProgress.is_fatal());
    }

    #[test]
    fn test_submit_mapping() {
        let err = SessionError::from_submit(ProviderError::UserRejected);
        assert!(matches!(err, SessionError::SubmissionRejected(_)));

        let err = SessionError::from_submit(ProviderError::Rpc {
            code: -32000,
            message: "insufficient funds".into(),
        });
        assert_eq!(err, SessionError::SubmissionRejected("insufficient funds".into()));

        let err = SessionError::from_submit(ProviderError::Network("connection refused".into()));
        assert!(matches!(err, SessionError::NetworkError(_)));
    }

    #[test]
    fn test_connect_mapping() {
        assert_eq!(
            SessionError::from_connect(ProviderError::UserRejected),
            SessionError::UserRejected
        );
        assert_eq!(
            SessionError::from_connect(ProviderError::Unavailable),
            SessionError::ProviderUnavailable
        );
    }

    #[test]
    fn test_error_display() {
        let err = SessionError::ChainMismatch {
            expected: 1337,
            actual: 1,
        };
        assert_eq!(err.to_string(), "Chain ID mismatch: expected 1337, got 1");
    }
}
