//! Ledger client capability
//!
//! The record store never talks to a node directly. It goes through the
//! [`LedgerClient`] trait, which answers read-only contract calls, submits
//! signed state-changing calls and reports chain status.
//!
//! ## Implementations
//!
//! - [`rpc::JsonRpcLedger`] - Ethereum-style JSON-RPC over HTTP
//! - [`simulated::SimulatedLedger`] - in-process contract emulation for
//!   tests, local runs and fault injection
//!
//! # Guarantees
//!
//! - One request per trait call; implementations do not retry
//! - Every failure is a [`LedgerError`]
//!
//! # Non-Guarantees
//!
//! - A returned transaction hash means the node accepted the submission,
//!   not that it was mined

pub mod identity;
pub mod rlp;
pub mod rpc;
pub mod simulated;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::abi::{AbiValue, Address, Method};
use crate::error::LedgerError;

pub use identity::{Identity, LegacyTransaction, Transactor};
pub use rpc::{JsonRpcLedger, JsonRpcLedgerConfig};
pub use simulated::SimulatedLedger;

/// Latest block summary, used for health checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: String,
    pub timestamp: u64,
}

/// A contract method invocation.
#[derive(Debug, Clone, Copy)]
pub struct ContractCall<'a> {
    pub contract: Address,
    pub from: Address,
    pub method: &'a Method,
    pub args: &'a [AbiValue],
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Next nonce for `address`, counting pending transactions.
    async fn pending_nonce(&self, address: Address) -> Result<u64, LedgerError>;

    /// Node's suggested gas price in wei.
    async fn suggest_gas_price(&self) -> Result<u128, LedgerError>;

    /// Header of the latest block.
    async fn latest_header(&self) -> Result<BlockHeader, LedgerError>;

    /// Execute a read-only method and return its decoded outputs.
    async fn call(&self, call: ContractCall<'_>) -> Result<Vec<AbiValue>, LedgerError>;

    /// Sign and submit a state-changing method. Returns the transaction hash.
    async fn transact(
        &self,
        call: ContractCall<'_>,
        transactor: &Transactor,
    ) -> Result<String, LedgerError>;
}
