//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every section has defaults, so an empty file is a valid local-node setup.

use serde::{Deserialize, Serialize};

/// Root configuration for the GetSet client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Network selection and confirmation policy.
    pub network: NetworkConfig,

    /// Where the deployment step left the contract artifacts.
    pub artifacts: ArtifactConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Network selection and transaction confirmation settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Chain ID the wallet must be connected to (1337 for the local node).
    pub chain_id: u64,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of blocks on top of the inclusion block before a transaction
    /// counts as confirmed. 0 accepts the inclusion block itself.
    pub confirmation_blocks: u32,

    /// How long to wait for a confirmation before reporting failure.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: 1337,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            rpc_timeout_secs: 10,
            confirmation_blocks: 0,
            confirmation_timeout_secs: 120,
            poll_interval_ms: 1000,
        }
    }
}

/// Location of the persisted `{address, abi}` pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Directory holding `<Name>.json` and `<Name>-address.json`.
    pub dir: String,

    /// Contract name used in the artifact file names.
    pub contract_name: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: "contract_data".to_string(),
            contract_name: "GetSet".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "getset=info".to_string(),
        }
    }
}
