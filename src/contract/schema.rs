//! Typed method schema derived from an ABI.
//!
//! Every argument is checked against the declared parameter kinds before
//! anything is sent to the provider, so type mismatches never reach the
//! network.

use alloy::dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy::json_abi::{Function, JsonAbi, StateMutability};
use alloy::primitives::{Bytes, Selector};

use crate::error::{SessionError, SessionResult};

/// Whether a method reads or writes chain state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `view` or `pure`: answered by `eth_call`, never signed.
    Read,
    /// Mutating: must be signed, broadcast, and confirmed.
    Write { payable: bool },
}

impl From<StateMutability> for CallKind {
    fn from(mutability: StateMutability) -> Self {
        match mutability {
            StateMutability::Pure | StateMutability::View => CallKind::Read,
            StateMutability::NonPayable => CallKind::Write { payable: false },
            StateMutability::Payable => CallKind::Write { payable: true },
        }
    }
}

/// One callable method with resolved argument and return kinds.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSchema {
    pub name: String,
    pub signature: String,
    pub selector: Selector,
    pub inputs: Vec<DynSolType>,
    pub outputs: Vec<DynSolType>,
    pub kind: CallKind,
}

impl MethodSchema {
    fn from_function(function: &Function) -> SessionResult<Self> {
        let resolve = |params: &[alloy::json_abi::Param]| {
            params
                .iter()
                .map(|param| {
                    param.resolve().map_err(|e| {
                        SessionError::InvalidDescriptor(format!(
                            "{}: cannot resolve parameter type '{}': {}",
                            function.name, param.ty, e
                        ))
                    })
                })
                .collect::<SessionResult<Vec<_>>>()
        };

        Ok(Self {
            name: function.name.clone(),
            signature: function.signature(),
            selector: function.selector(),
            inputs: resolve(&function.inputs)?,
            outputs: resolve(&function.outputs)?,
            kind: function.state_mutability.into(),
        })
    }

    /// Parse user-supplied strings into typed arguments.
    pub fn parse_args(&self, raw: &[&str]) -> SessionResult<Vec<DynSolValue>> {
        self.check_arity(raw.len())?;
        self.inputs
            .iter()
            .zip(raw)
            .map(|(ty, s)| {
                ty.coerce_str(s.trim()).map_err(|e| {
                    SessionError::InvalidInput(format!(
                        "{}: '{}' is not a valid {}: {}",
                        self.name, s, ty, e
                    ))
                })
            })
            .collect()
    }

    /// Check `args` against the schema and ABI-encode the call data.
    pub fn encode_input(&self, args: &[DynSolValue]) -> SessionResult<Bytes> {
        self.check_arity(args.len())?;
        for (index, (ty, arg)) in self.inputs.iter().zip(args).enumerate() {
            if !ty.matches(arg) {
                return Err(SessionError::InvalidInput(format!(
                    "{}: argument {} expected {}, got {:?}",
                    self.name, index, ty, arg
                )));
            }
        }

        let mut data = self.selector.to_vec();
        data.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());
        Ok(Bytes::from(data))
    }

    /// Decode return data into the declared output kinds.
    pub fn decode_output(&self, data: &[u8]) -> SessionResult<Vec<DynSolValue>> {
        if self.outputs.is_empty() {
            return Ok(Vec::new());
        }
        let decoded = DynSolType::Tuple(self.outputs.clone())
            .abi_decode_params(data)
            .map_err(|e| {
                SessionError::CallFailed(format!("{}: cannot decode return data: {}", self.name, e))
            })?;
        match decoded {
            DynSolValue::Tuple(values) => Ok(values),
            other => Ok(vec![other]),
        }
    }

    fn check_arity(&self, given: usize) -> SessionResult<()> {
        if given != self.inputs.len() {
            return Err(SessionError::InvalidInput(format!(
                "{} takes {} argument(s), got {}",
                self.name,
                self.inputs.len(),
                given
            )));
        }
        Ok(())
    }
}

/// Typed view of a contract interface.
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceSchema {
    methods: Vec<MethodSchema>,
    accepts_transfers: bool,
}

impl InterfaceSchema {
    /// Resolve every function of `abi`. Fails if any type is unsupported.
    pub fn from_abi(abi: &JsonAbi) -> SessionResult<Self> {
        let methods = abi
            .functions()
            .map(MethodSchema::from_function)
            .collect::<SessionResult<Vec<_>>>()?;

        let accepts_transfers = abi.receive.is_some()
            || abi
                .fallback
                .as_ref()
                .is_some_and(|f| f.state_mutability == StateMutability::Payable);

        Ok(Self {
            methods,
            accepts_transfers,
        })
    }

    /// Look a method up by full signature (`set(uint256)`) or, when not
    /// overloaded, by bare name.
    pub fn method(&self, name_or_signature: &str) -> SessionResult<&MethodSchema> {
        if let Some(method) = self.methods.iter().find(|m| m.signature == name_or_signature) {
            return Ok(method);
        }

        let mut candidates = self.methods.iter().filter(|m| m.name == name_or_signature);
        match (candidates.next(), candidates.next()) {
            (Some(method), None) => Ok(method),
            (Some(_), Some(_)) => Err(SessionError::InvalidInput(format!(
                "'{}' is overloaded, use the full signature",
                name_or_signature
            ))),
            (None, _) => Err(SessionError::InvalidInput(format!(
                "contract has no method '{}'",
                name_or_signature
            ))),
        }
    }

    /// All methods.
    pub fn methods(&self) -> &[MethodSchema] {
        &self.methods
    }

    /// Whether plain value transfers reach a payable `receive`/`fallback`.
    pub fn accepts_transfers(&self) -> bool {
        self.accepts_transfers
    }
}
