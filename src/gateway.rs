//! Contract gateway
//!
//! Turns named method calls with typed arguments into ledger calls against
//! one deployed contract, using the parsed [`MethodInterface`].
//!
//! # Guarantees
//!
//! - Arguments are checked against the interface before anything is sent
//! - Only read-only methods are called, only state-changing ones submitted
//! - Results are checked against the declared outputs (count and type)
//! - Failures are [`GatewayError`] values; a panic inside the ledger client
//!   is caught and reported as an error
//!
//! # Non-Guarantees
//!
//! - No retries; one ledger request per call
//! - A submission hash does not mean the transaction was mined

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, warn};

use crate::abi::{AbiValue, Address, Method, MethodInterface};
use crate::error::{GatewayError, LedgerError};
use crate::ledger::{BlockHeader, ContractCall, Identity, LedgerClient, Transactor};

/// Outputs of a read-only call, with typed accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOutput {
    method: String,
    values: Vec<AbiValue>,
}

impl ViewOutput {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[AbiValue] {
        &self.values
    }

    fn get(&self, index: usize) -> Result<&AbiValue, GatewayError> {
        self.values.get(index).ok_or_else(|| {
            self.decode_error(format!("no output at index {} (have {})", index, self.values.len()))
        })
    }

    fn decode_error(&self, reason: String) -> GatewayError {
        GatewayError::Decode {
            method: self.method.clone(),
            reason,
        }
    }

    fn mismatch(&self, index: usize, expected: &str, got: &AbiValue) -> GatewayError {
        self.decode_error(format!(
            "output {} is {}, expected {}",
            index,
            got.type_name(),
            expected
        ))
    }

    pub fn string(&self, index: usize) -> Result<String, GatewayError> {
        match self.get(index)? {
            AbiValue::String(s) => Ok(s.clone()),
            other => Err(self.mismatch(index, "string", other)),
        }
    }

    pub fn uint(&self, index: usize) -> Result<u128, GatewayError> {
        match self.get(index)? {
            AbiValue::Uint(v) => Ok(*v),
            other => Err(self.mismatch(index, "uint", other)),
        }
    }

    pub fn address(&self, index: usize) -> Result<Address, GatewayError> {
        match self.get(index)? {
            AbiValue::Address(a) => Ok(*a),
            other => Err(self.mismatch(index, "address", other)),
        }
    }

    pub fn bool(&self, index: usize) -> Result<bool, GatewayError> {
        match self.get(index)? {
            AbiValue::Bool(b) => Ok(*b),
            other => Err(self.mismatch(index, "bool", other)),
        }
    }

    /// A list of identifiers. Accepts `string[]`, and `bytes[]`/`bytesN[]`
    /// holding UTF-8 (trailing zero padding is dropped).
    pub fn string_list(&self, index: usize) -> Result<Vec<String>, GatewayError> {
        let items = match self.get(index)? {
            AbiValue::Array(items) => items,
            other => return Err(self.mismatch(index, "string[]", other)),
        };
        items
            .iter()
            .map(|item| match item {
                AbiValue::String(s) => Ok(s.clone()),
                AbiValue::Bytes(b) | AbiValue::FixedBytes(b) => {
                    let end = b.iter().rposition(|x| *x != 0).map_or(0, |p| p + 1);
                    String::from_utf8(b[..end].to_vec())
                        .map_err(|_| self.decode_error("identifier is not UTF-8".into()))
                }
                other => Err(self.mismatch(index, "string", other)),
            })
            .collect()
    }
}

/// Bridge between typed method calls and a [`LedgerClient`].
pub struct ContractGateway {
    client: Arc<dyn LedgerClient>,
    interface: Arc<MethodInterface>,
    contract: Address,
    identity: Arc<Identity>,
    chain_id: u64,
}

impl ContractGateway {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        interface: Arc<MethodInterface>,
        contract: Address,
        identity: Arc<Identity>,
        chain_id: u64,
    ) -> Self {
        Self {
            client,
            interface,
            contract,
            identity,
            chain_id,
        }
    }

    /// Address of the submitting identity.
    pub fn sender(&self) -> Address {
        self.identity.address()
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn interface(&self) -> &MethodInterface {
        &self.interface
    }

    fn resolve(&self, name: &str, args: &[AbiValue]) -> Result<&Method, GatewayError> {
        let method = self
            .interface
            .method(name)
            .ok_or_else(|| GatewayError::UnknownMethod(name.to_string()))?;

        if method.inputs.len() != args.len() {
            return Err(GatewayError::ArgumentMismatch {
                method: name.to_string(),
                reason: format!("expected {} arguments, got {}", method.inputs.len(), args.len()),
            });
        }
        for (param, arg) in method.inputs.iter().zip(args) {
            if !param.kind.matches(arg) {
                return Err(GatewayError::ArgumentMismatch {
                    method: name.to_string(),
                    reason: format!(
                        "argument {} must be {}, got {}",
                        param.name,
                        param.kind,
                        arg.type_name()
                    ),
                });
            }
        }
        Ok(method)
    }

    fn check_outputs(method: &Method, values: &[AbiValue]) -> Result<(), GatewayError> {
        if values.len() != method.outputs.len() {
            return Err(GatewayError::Decode {
                method: method.name.clone(),
                reason: format!(
                    "expected {} outputs, got {}",
                    method.outputs.len(),
                    values.len()
                ),
            });
        }
        for (i, (param, value)) in method.outputs.iter().zip(values).enumerate() {
            if !param.kind.matches(value) {
                return Err(GatewayError::Decode {
                    method: method.name.clone(),
                    reason: format!("output {} is {}, expected {}", i, value.type_name(), param.kind),
                });
            }
        }
        Ok(())
    }

    /// Execute a read-only method.
    pub async fn call_view(&self, method: &str, args: &[AbiValue]) -> Result<ViewOutput, GatewayError> {
        let resolved = self.resolve(method, args)?;
        if !resolved.is_view() {
            return Err(GatewayError::WrongMutability {
                method: method.to_string(),
                usage: "a view call",
            });
        }
        let call = ContractCall {
            contract: self.contract,
            from: self.identity.address(),
            method: resolved,
            args,
        };

        let values = match AssertUnwindSafe(self.client.call(call)).catch_unwind().await {
            Ok(Ok(values)) => values,
            Ok(Err(source)) => {
                debug!(method = %method, error = %source, "View call failed");
                return Err(GatewayError::ViewCall {
                    method: method.to_string(),
                    source,
                });
            }
            Err(panic) => {
                let reason = panic_message(panic);
                warn!(method = %method, reason = %reason, "Ledger client panicked during view call");
                return Err(GatewayError::Decode {
                    method: method.to_string(),
                    reason,
                });
            }
        };

        Self::check_outputs(resolved, &values)?;
        Ok(ViewOutput {
            method: method.to_string(),
            values,
        })
    }

    /// Sign and submit a state-changing method. Returns the transaction hash.
    pub async fn submit(&self, method: &str, args: &[AbiValue]) -> Result<String, GatewayError> {
        let resolved = self.resolve(method, args)?;
        if resolved.is_view() {
            return Err(GatewayError::WrongMutability {
                method: method.to_string(),
                usage: "a transaction",
            });
        }
        let transactor = Transactor::new(Arc::clone(&self.identity), self.chain_id)
            .map_err(|e| GatewayError::Transactor(e.to_string()))?;
        let call = ContractCall {
            contract: self.contract,
            from: transactor.from(),
            method: resolved,
            args,
        };

        match AssertUnwindSafe(self.client.transact(call, &transactor))
            .catch_unwind()
            .await
        {
            Ok(Ok(tx_hash)) => Ok(tx_hash),
            Ok(Err(source)) => Err(GatewayError::Submit {
                method: method.to_string(),
                source,
            }),
            Err(panic) => {
                let reason = panic_message(panic);
                warn!(method = %method, reason = %reason, "Ledger client panicked during submission");
                Err(GatewayError::Submit {
                    method: method.to_string(),
                    source: LedgerError::InvalidResponse(reason),
                })
            }
        }
    }

    /// Latest block header, bounded by `timeout`.
    pub async fn latest_header(&self, timeout: Duration) -> Result<BlockHeader, GatewayError> {
        let fetch = AssertUnwindSafe(self.client.latest_header()).catch_unwind();
        match tokio::time::timeout(timeout, fetch).await {
            Err(_) => Err(GatewayError::Timeout(format!(
                "no block header within {:?}",
                timeout
            ))),
            Ok(Ok(Ok(header))) => Ok(header),
            Ok(Ok(Err(source))) => Err(GatewayError::ViewCall {
                method: "latestHeader".to_string(),
                source,
            }),
            Ok(Err(panic)) => Err(GatewayError::Decode {
                method: "latestHeader".to_string(),
                reason: panic_message(panic),
            }),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
