//! Deployed contract descriptor: address plus ABI.

use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{SessionError, SessionResult};

/// Shape of `<Name>-address.json` as written by the deployment script.
#[derive(Debug, Deserialize)]
struct AddressFile {
    address: Address,
}

/// Immutable `{address, interface}` pair of a deployed contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDescriptor {
    address: Address,
    abi: JsonAbi,
}

impl ContractDescriptor {
    /// Build a descriptor from already-parsed parts.
    pub fn new(address: Address, abi: JsonAbi) -> Self {
        Self { address, abi }
    }

    /// Parse the two deployment artifacts.
    ///
    /// `abi_json` may be a full Hardhat artifact (with an `abi` field) or a
    /// bare ABI array.
    pub fn from_json(address_json: &str, abi_json: &str) -> SessionResult<Self> {
        let AddressFile { address } = serde_json::from_str(address_json).map_err(|e| {
            SessionError::InvalidDescriptor(format!("invalid address artifact: {}", e))
        })?;

        let value: Value = serde_json::from_str(abi_json).map_err(|e| {
            SessionError::InvalidDescriptor(format!("invalid ABI artifact: {}", e))
        })?;
        let abi_value = match value {
            Value::Object(mut artifact) => artifact.remove("abi").ok_or_else(|| {
                SessionError::InvalidDescriptor("artifact has no `abi` field".to_string())
            })?,
            other => other,
        };
        let abi: JsonAbi = serde_json::from_value(abi_value)
            .map_err(|e| SessionError::InvalidDescriptor(format!("invalid ABI: {}", e)))?;

        Ok(Self::new(address, abi))
    }

    /// Deployed address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Raw interface description.
    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }
}
