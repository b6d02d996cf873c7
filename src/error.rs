//! Error types for contest-ledger
//!
//! Three layers, each with its own enum:
//!
//! - [`LedgerError`] - what the ledger node (or the simulated contract) reported
//! - [`GatewayError`] - what went wrong turning a typed method call into a ledger call
//! - [`StoreError`] - what a record-store operation returns to its caller
//!
//! `StoreError::user_message` is the short human text placed in response
//! envelopes; `Display` keeps the full cause chain for logs.

use thiserror::Error;

use crate::abi::AbiError;

/// Failures reported by a [`crate::ledger::LedgerClient`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Execution reverted: {0}")]
    Reverted(String),

    #[error("ABI error: {0}")]
    Abi(#[from] AbiError),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// Failures at the contract gateway boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Failed to load method interface: {0}")]
    InterfaceLoad(String),

    #[error("Method not found in interface: {0}")]
    UnknownMethod(String),

    #[error("Invalid arguments for {method}: {reason}")]
    ArgumentMismatch { method: String, reason: String },

    #[error("Method {method} cannot be used as {usage}")]
    WrongMutability { method: String, usage: &'static str },

    #[error("View call {method} failed: {source}")]
    ViewCall {
        method: String,
        #[source]
        source: LedgerError,
    },

    #[error("Submission of {method} failed: {source}")]
    Submit {
        method: String,
        #[source]
        source: LedgerError,
    },

    #[error("Failed to create transactor: {0}")]
    Transactor(String),

    #[error("Failed to decode result of {method}: {reason}")]
    Decode { method: String, reason: String },

    #[error("Ledger timeout: {0}")]
    Timeout(String),
}

/// Errors returned by record-store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Contestant {contestant_id} already registered for contest {contest_id}")]
    AlreadyRegistered {
        contest_id: String,
        contestant_id: String,
    },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("{context}: {source}")]
    Gateway {
        context: String,
        #[source]
        source: GatewayError,
    },

    #[error("Initialization error: {0}")]
    Initialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Wrap a gateway failure with the operation's user-facing message.
    pub fn gateway(context: impl Into<String>, source: GatewayError) -> Self {
        StoreError::Gateway {
            context: context.into(),
            source,
        }
    }

    /// Short message suitable for a response envelope.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::Validation(msg) => msg.clone(),
            StoreError::NotFound { kind, .. } => format!("{} not found", kind),
            StoreError::AlreadyRegistered { .. } => {
                "Contestant already registered for this contest".to_string()
            }
            StoreError::MalformedRecord(_) => "Stored record could not be decoded".to_string(),
            StoreError::Gateway { context, .. } => context.clone(),
            other => other.to_string(),
        }
    }
}
