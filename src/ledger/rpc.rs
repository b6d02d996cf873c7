//! JSON-RPC ledger client
//!
//! Talks to an Ethereum-compatible node over HTTP. Calls are ABI-encoded
//! locally, submissions are signed locally as legacy EIP-155 transactions
//! and broadcast with `eth_sendRawTransaction`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{BlockHeader, ContractCall, LedgerClient, LegacyTransaction, Transactor};
use crate::abi::{AbiValue, Address};
use crate::error::LedgerError;

/// Client configuration.
#[derive(Debug, Clone)]
pub struct JsonRpcLedgerConfig {
    /// Node endpoint, e.g. `https://rpc.ankr.com/polygon_mumbai`
    pub url: String,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Extra gas on top of the node's estimate, in percent
    pub gas_headroom_percent: u64,
}

impl Default for JsonRpcLedgerConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".to_string(),
            request_timeout: Duration::from_secs(30),
            gas_headroom_percent: 20,
        }
    }
}

pub struct JsonRpcLedger {
    config: JsonRpcLedgerConfig,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct RawBlock {
    number: String,
    hash: Option<String>,
    timestamp: String,
}

impl JsonRpcLedger {
    pub fn new(config: JsonRpcLedgerConfig) -> Result<Self, LedgerError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent("contest-ledger/0.1")
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(rpc_method = %method, id, "JSON-RPC request");

        let response = self
            .http_client
            .post(&self.config.url)
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LedgerError::Timeout(format!("{} timed out", method))
                } else {
                    LedgerError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(LedgerError::Transport(format!(
                "HTTP {} from {}",
                response.status(),
                self.config.url
            )));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        if let Some(err) = body.error {
            return Err(classify_rpc_error(err.code, err.message));
        }

        let result = body.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map_err(|e| LedgerError::InvalidResponse(format!("{}: {}", method, e)))
    }

    async fn estimate_gas(&self, from: Address, to: Address, data: &str) -> Result<u64, LedgerError> {
        let raw: String = self
            .request(
                "eth_estimateGas",
                json!([{ "from": hex_address(&from), "to": hex_address(&to), "data": data }]),
            )
            .await?;
        let estimate = parse_quantity(&raw)? as u64;
        Ok(estimate.saturating_add(estimate.saturating_mul(self.config.gas_headroom_percent) / 100))
    }
}

#[async_trait]
impl LedgerClient for JsonRpcLedger {
    async fn pending_nonce(&self, address: Address) -> Result<u64, LedgerError> {
        let raw: String = self
            .request("eth_getTransactionCount", json!([hex_address(&address), "pending"]))
            .await?;
        u64::try_from(parse_quantity(&raw)?)
            .map_err(|_| LedgerError::InvalidResponse("nonce out of range".into()))
    }

    async fn suggest_gas_price(&self) -> Result<u128, LedgerError> {
        let raw: String = self.request("eth_gasPrice", json!([])).await?;
        parse_quantity(&raw)
    }

    async fn latest_header(&self) -> Result<BlockHeader, LedgerError> {
        let block: Option<RawBlock> = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        let block = block.ok_or_else(|| LedgerError::InvalidResponse("no latest block".into()))?;
        Ok(BlockHeader {
            number: parse_quantity(&block.number)? as u64,
            hash: block.hash.unwrap_or_default(),
            timestamp: parse_quantity(&block.timestamp)? as u64,
        })
    }

    async fn call(&self, call: ContractCall<'_>) -> Result<Vec<AbiValue>, LedgerError> {
        let data = format!("0x{}", hex::encode(call.method.encode_call(call.args)?));
        let raw: String = self
            .request(
                "eth_call",
                json!([
                    { "from": hex_address(&call.from), "to": hex_address(&call.contract), "data": data },
                    "latest"
                ]),
            )
            .await?;

        let bytes = decode_hex(&raw)?;
        if bytes.is_empty() && !call.method.outputs.is_empty() {
            return Err(LedgerError::InvalidResponse(format!(
                "empty result from {}; is the contract deployed at {}?",
                call.method.name, call.contract
            )));
        }
        Ok(call.method.decode_output(&bytes)?)
    }

    async fn transact(
        &self,
        call: ContractCall<'_>,
        transactor: &Transactor,
    ) -> Result<String, LedgerError> {
        let from = transactor.from();
        let data = call.method.encode_call(call.args)?;
        let data_hex = format!("0x{}", hex::encode(&data));

        let nonce = self.pending_nonce(from).await?;
        let gas_price = self.suggest_gas_price().await?;
        let gas_limit = self.estimate_gas(from, call.contract, &data_hex).await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to: call.contract,
            value: 0,
            data,
        };
        let raw = transactor.sign(&tx)?;

        let hash: String = self
            .request("eth_sendRawTransaction", json!([format!("0x{}", hex::encode(raw))]))
            .await?;
        debug!(method = %call.method.name, nonce, gas_limit, tx_hash = %hash, "Transaction submitted");
        Ok(hash)
    }
}

fn hex_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address.as_bytes()))
}

fn classify_rpc_error(code: i64, message: String) -> LedgerError {
    // Nodes report contract reverts as code 3 or with "revert" in the message.
    if code == 3 || message.to_ascii_lowercase().contains("revert") {
        warn!(code, message = %message, "Contract call reverted");
        LedgerError::Reverted(message)
    } else {
        LedgerError::Rpc { code, message }
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(raw: &str) -> Result<u128, LedgerError> {
    let digits = raw
        .strip_prefix("0x")
        .ok_or_else(|| LedgerError::InvalidResponse(format!("quantity without 0x: {}", raw)))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| LedgerError::InvalidResponse(format!("bad quantity {}: {}", raw, e)))
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, LedgerError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| LedgerError::InvalidResponse(format!("bad hex data: {}", e)))
}
