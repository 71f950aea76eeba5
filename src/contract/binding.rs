//! Contract binding: a descriptor tied to a signing identity.

use std::sync::Arc;

use alloy::dyn_abi::DynSolValue;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::TransactionRequest;

use crate::blockchain::transaction::WriteCall;
use crate::contract::descriptor::ContractDescriptor;
use crate::contract::schema::{CallKind, InterfaceSchema, MethodSchema};
use crate::error::{SessionError, SessionResult};
use crate::session::SigningIdentity;

/// Callable proxy for one deployed contract, valid while its identity is.
#[derive(Debug, Clone)]
pub struct ContractBindingHandle {
    descriptor: Arc<ContractDescriptor>,
    schema: Arc<InterfaceSchema>,
    identity: SigningIdentity,
}

impl ContractBindingHandle {
    /// Bind `descriptor` to `identity`.
    ///
    /// Pure: resolves the typed method schema, performs no I/O.
    pub fn bind(
        descriptor: Arc<ContractDescriptor>,
        identity: SigningIdentity,
    ) -> SessionResult<Self> {
        if descriptor.address() == Address::ZERO {
            return Err(SessionError::InvalidDescriptor(
                "contract address is zero".to_string(),
            ));
        }
        let schema = InterfaceSchema::from_abi(descriptor.abi())?;

        tracing::debug!(
            contract = %descriptor.address(),
            signer = %identity.address(),
            methods = schema.methods().len(),
            "Contract bound"
        );

        Ok(Self {
            descriptor,
            schema: Arc::new(schema),
            identity,
        })
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.descriptor.address()
    }

    /// Identity the handle signs with.
    pub fn identity(&self) -> &SigningIdentity {
        &self.identity
    }

    /// Typed interface.
    pub fn schema(&self) -> &InterfaceSchema {
        &self.schema
    }

    /// Whether the identity behind this handle is still live.
    pub fn is_valid(&self) -> bool {
        self.identity.is_active()
    }

    fn method(&self, name: &str, expected: CallKind) -> SessionResult<&MethodSchema> {
        let method = self.schema.method(name)?;
        match (expected, method.kind) {
            (CallKind::Read, CallKind::Read) | (CallKind::Write { .. }, CallKind::Write { .. }) => {
                Ok(method)
            }
            (CallKind::Read, _) => Err(SessionError::InvalidInput(format!(
                "'{}' changes state and must be sent as a transaction",
                method.signature
            ))),
            (_, _) => Err(SessionError::InvalidInput(format!(
                "'{}' is read-only and cannot be sent as a transaction",
                method.signature
            ))),
        }
    }

    /// Run a read call against the latest state.
    ///
    /// Never signs and never produces a pending transaction.
    pub async fn call(&self, method: &str, args: &[DynSolValue]) -> SessionResult<Vec<DynSolValue>> {
        self.identity.ensure_active()?;
        let method = self.method(method, CallKind::Read)?;
        let input = method.encode_input(args)?;

        let request = TransactionRequest::default()
            .with_from(self.identity.address())
            .with_to(self.address())
            .with_input(input);

        let output = self
            .identity
            .provider()
            .call(request)
            .await
            .map_err(SessionError::from_read)?;
        method.decode_output(&output)
    }

    /// Prepare a state-changing call, optionally carrying `value` wei.
    pub fn send(&self, method: &str, args: &[DynSolValue], value: U256) -> SessionResult<WriteCall> {
        self.identity.ensure_active()?;
        let method = self.method(method, CallKind::Write { payable: false })?;
        if !value.is_zero() && method.kind != (CallKind::Write { payable: true }) {
            return Err(SessionError::InvalidInput(format!(
                "'{}' is not payable",
                method.signature
            )));
        }
        let input = method.encode_input(args)?;

        Ok(WriteCall::new(
            self.identity.clone(),
            self.address(),
            value,
            input,
            method.signature.clone(),
        ))
    }

    /// Prepare a plain value transfer to the contract.
    pub fn transfer(&self, value: U256) -> SessionResult<WriteCall> {
        self.identity.ensure_active()?;
        if value.is_zero() {
            return Err(SessionError::InvalidInput(
                "transfer amount must be positive".to_string(),
            ));
        }
        if !self.schema.accepts_transfers() {
            return Err(SessionError::InvalidInput(
                "contract has no payable receive or fallback".to_string(),
            ));
        }

        Ok(WriteCall::new(
            self.identity.clone(),
            self.address(),
            value,
            Bytes::new(),
            "transfer",
        ))
    }
}
