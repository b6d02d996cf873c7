//! In-process contract emulation
//!
//! [`SimulatedLedger`] answers the `ContentStorage` methods the record store
//! uses, keeping contract state in memory. It backs the `simulated` store
//! backend and the test suites.
//!
//! Besides the happy path it can inject faults per method (and optionally
//! per first argument), go offline, and count calls, so tests can assert
//! that an operation never reached the ledger.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{BlockHeader, ContractCall, LedgerClient, Transactor};
use crate::abi::{keccak256, AbiValue, Address};
use crate::codec;
use crate::error::LedgerError;

/// Chain id used when none is given.
pub const DEFAULT_CHAIN_ID: u64 = 1337;

const GAS_PRICE_WEI: u128 = 1_000_000_000;

/// What an injected fault does when its method is called.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Fail with this error.
    Fail(LedgerError),
    /// Return these values instead of the real result.
    Respond(Vec<AbiValue>),
    /// Panic inside the client.
    Panic(String),
}

#[derive(Default)]
struct ContractState {
    contest_ids: Vec<String>,
    contest_json: HashMap<String, String>,
    nonces: HashMap<Address, u64>,
    block_number: u64,
    faults: HashMap<(String, Option<String>), Fault>,
    offline: bool,
}

pub struct SimulatedLedger {
    chain_id: u64,
    state: RwLock<ContractState>,
    view_calls: AtomicUsize,
    transactions: AtomicUsize,
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID)
    }
}

impl SimulatedLedger {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            state: RwLock::new(ContractState::default()),
            view_calls: AtomicUsize::new(0),
            transactions: AtomicUsize::new(0),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Read-only calls received so far.
    pub fn view_calls(&self) -> usize {
        self.view_calls.load(Ordering::SeqCst)
    }

    /// Submissions received so far, including rejected ones.
    pub fn transactions(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }

    /// Inject a fault for `method`. With `first_arg`, only calls whose first
    /// string argument equals it are affected.
    pub async fn inject_fault(&self, method: &str, first_arg: Option<&str>, fault: Fault) {
        let mut state = self.state.write().await;
        state
            .faults
            .insert((method.to_string(), first_arg.map(str::to_string)), fault);
    }

    pub async fn clear_faults(&self) {
        self.state.write().await.faults.clear();
    }

    /// While offline every request fails with a transport error.
    pub async fn set_offline(&self, offline: bool) {
        self.state.write().await.offline = offline;
    }

    /// Write a raw contest JSON blob straight into contract storage.
    pub async fn seed_contest_json(&self, id: &str, json: &str) {
        let mut state = self.state.write().await;
        if !state.contest_json.contains_key(id) {
            state.contest_ids.push(id.to_string());
        }
        state.contest_json.insert(id.to_string(), json.to_string());
    }

    async fn fault_for(&self, method: &str, args: &[AbiValue]) -> Result<Option<Fault>, LedgerError> {
        let state = self.state.read().await;
        if state.offline {
            return Err(LedgerError::Transport("simulated node offline".into()));
        }
        let first = args.first().and_then(AbiValue::as_str).map(str::to_string);
        Ok(state
            .faults
            .get(&(method.to_string(), first))
            .or_else(|| state.faults.get(&(method.to_string(), None)))
            .cloned())
    }

    async fn view(&self, method: &str, args: &[AbiValue]) -> Result<Vec<AbiValue>, LedgerError> {
        let state = self.state.read().await;
        match method {
            "getContestJsonById" => {
                let id = string_arg(args, 0)?;
                let json = state.contest_json.get(id).cloned().unwrap_or_default();
                Ok(vec![AbiValue::String(json)])
            }
            "getAllContestIds" => Ok(vec![AbiValue::Array(
                state
                    .contest_ids
                    .iter()
                    .map(|id| AbiValue::String(id.clone()))
                    .collect(),
            )]),
            "getContest" => {
                let id = string_arg(args, 0)?;
                let json = state
                    .contest_json
                    .get(id)
                    .ok_or_else(|| LedgerError::Reverted("Contest does not exist".into()))?;
                let doc = codec::decode_contest(json.as_bytes())
                    .map_err(|_| LedgerError::Reverted("Contest fields unavailable".into()))?;
                let organizer = doc.organizer.parse::<Address>().unwrap_or(Address::ZERO);
                Ok(vec![
                    AbiValue::String(doc.name),
                    AbiValue::String(doc.description),
                    AbiValue::Uint(epoch_seconds(doc.start_date.timestamp())),
                    AbiValue::Uint(epoch_seconds(doc.end_date.timestamp())),
                    AbiValue::Address(organizer),
                    AbiValue::Bool(true),
                    AbiValue::String(doc.image_url),
                ])
            }
            other => Err(LedgerError::Reverted(format!(
                "method {} not available in simulated contract",
                other
            ))),
        }
    }
}

fn string_arg(args: &[AbiValue], index: usize) -> Result<&str, LedgerError> {
    args.get(index)
        .and_then(AbiValue::as_str)
        .ok_or_else(|| LedgerError::Reverted(format!("argument {} must be a string", index)))
}

fn epoch_seconds(ts: i64) -> u128 {
    u128::try_from(ts).unwrap_or(0)
}

fn apply_fault<T>(fault: Fault, respond: impl FnOnce(Vec<AbiValue>) -> T) -> Result<T, LedgerError> {
    match fault {
        Fault::Fail(err) => Err(err),
        Fault::Respond(values) => Ok(respond(values)),
        Fault::Panic(msg) => panic!("{}", msg),
    }
}

#[async_trait]
impl LedgerClient for SimulatedLedger {
    async fn pending_nonce(&self, address: Address) -> Result<u64, LedgerError> {
        let state = self.state.read().await;
        if state.offline {
            return Err(LedgerError::Transport("simulated node offline".into()));
        }
        Ok(state.nonces.get(&address).copied().unwrap_or(0))
    }

    async fn suggest_gas_price(&self) -> Result<u128, LedgerError> {
        if self.state.read().await.offline {
            return Err(LedgerError::Transport("simulated node offline".into()));
        }
        Ok(GAS_PRICE_WEI)
    }

    async fn latest_header(&self) -> Result<BlockHeader, LedgerError> {
        let state = self.state.read().await;
        if state.offline {
            return Err(LedgerError::Transport("simulated node offline".into()));
        }
        Ok(BlockHeader {
            number: state.block_number,
            hash: format!("0x{}", hex::encode(keccak256(&state.block_number.to_be_bytes()))),
            timestamp: epoch_seconds(Utc::now().timestamp()) as u64,
        })
    }

    async fn call(&self, call: ContractCall<'_>) -> Result<Vec<AbiValue>, LedgerError> {
        self.view_calls.fetch_add(1, Ordering::SeqCst);
        // Arguments go through the wire encoder so type errors surface here too.
        call.method.encode_call(call.args)?;

        if let Some(fault) = self.fault_for(&call.method.name, call.args).await? {
            debug!(method = %call.method.name, "Simulated fault on view call");
            return apply_fault(fault, |values| values);
        }
        self.view(&call.method.name, call.args).await
    }

    async fn transact(
        &self,
        call: ContractCall<'_>,
        transactor: &Transactor,
    ) -> Result<String, LedgerError> {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        let data = call.method.encode_call(call.args)?;

        if transactor.chain_id() != self.chain_id {
            return Err(LedgerError::Rpc {
                code: -32000,
                message: format!(
                    "invalid chain id {} (expected {})",
                    transactor.chain_id(),
                    self.chain_id
                ),
            });
        }

        if let Some(fault) = self.fault_for(&call.method.name, call.args).await? {
            debug!(method = %call.method.name, "Simulated fault on submission");
            // A forced response on a submission just means "accepted".
            apply_fault(fault, |_| ())?;
        }

        let mut state = self.state.write().await;
        match call.method.name.as_str() {
            "createContestJson" => {
                let id = string_arg(call.args, 0)?.to_string();
                let json = string_arg(call.args, 1)?.to_string();
                if state.contest_json.contains_key(&id) {
                    return Err(LedgerError::Reverted("Contest already exists".into()));
                }
                state.contest_ids.push(id.clone());
                state.contest_json.insert(id, json);
            }
            other => {
                return Err(LedgerError::Reverted(format!(
                    "method {} not available in simulated contract",
                    other
                )))
            }
        }

        let from = transactor.from();
        let nonce = state.nonces.entry(from).or_insert(0);
        let used = *nonce;
        *nonce += 1;
        state.block_number += 1;

        let mut preimage = from.as_bytes().to_vec();
        preimage.extend_from_slice(&used.to_be_bytes());
        preimage.extend_from_slice(&data);
        Ok(format!("0x{}", hex::encode(keccak256(&preimage))))
    }
}
