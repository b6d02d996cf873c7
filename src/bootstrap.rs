//! Store construction from configuration
//!
//! Everything a store needs is resolved here, once: the signing identity,
//! the contract's method interface, the ledger client and (for the ledger
//! backend) a reachability probe. Any failure is an
//! [`StoreError::Initialization`] and aborts startup.

use std::sync::Arc;

use tracing::{info, warn};

use crate::abi::{load_interface_file, Address, MethodInterface, CONTENT_STORAGE_INTERFACE};
use crate::config::Config;
use crate::error::StoreError;
use crate::gateway::ContractGateway;
use crate::ledger::{
    Identity, JsonRpcLedger, JsonRpcLedgerConfig, LedgerClient, SimulatedLedger,
};
use crate::store::ledger::{CREATE_CONTEST_JSON, GET_ALL_CONTEST_IDS, GET_CONTEST, GET_CONTEST_JSON};
use crate::store::{LedgerStore, MemoryStore, RecordStore, StoreBackend};

/// Methods the ledger store calls. The interface must define all of them.
pub const REQUIRED_METHODS: [&str; 4] = [
    CREATE_CONTEST_JSON,
    GET_CONTEST_JSON,
    GET_ALL_CONTEST_IDS,
    GET_CONTEST,
];

/// Build the store selected by `config.backend`.
pub async fn build_store(config: &Config) -> Result<Arc<dyn RecordStore>, StoreError> {
    config.validate().map_err(StoreError::Initialization)?;

    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store; nothing is written to a ledger");
            let store = match config.signing_key() {
                Some(key) => {
                    let identity = parse_identity(key)?;
                    info!(organizer = %identity.address(), "Recording configured identity as organizer");
                    MemoryStore::with_identity(identity.address().to_string())
                }
                None => MemoryStore::new(),
            };
            Ok(Arc::new(store))
        }
        StoreBackend::Simulated => {
            let ledger = Arc::new(SimulatedLedger::new(config.chain_id));
            let identity = match config.signing_key() {
                Some(key) => parse_identity(key)?,
                None => Identity::random(),
            };
            let contract = match config.contract() {
                Some(raw) => parse_contract(raw)?,
                None => Address::ZERO,
            };
            info!(sender = %identity.address(), chain_id = config.chain_id, "Using simulated ledger");

            let gateway = gateway_for(ledger, config, contract, identity)?;
            Ok(Arc::new(
                LedgerStore::new(gateway).with_health_timeout(config.health_timeout()),
            ))
        }
        StoreBackend::Ledger => {
            // validate() guarantees both are present for this backend
            let key = config
                .signing_key()
                .ok_or_else(|| StoreError::Initialization("private key is required".into()))?;
            let contract = config
                .contract()
                .ok_or_else(|| StoreError::Initialization("contract address is required".into()))
                .and_then(parse_contract)?;
            let identity = parse_identity(key)?;

            let client = JsonRpcLedger::new(JsonRpcLedgerConfig {
                url: config.network_url.clone(),
                request_timeout: config.request_timeout(),
                ..JsonRpcLedgerConfig::default()
            })
            .map_err(|e| StoreError::Initialization(format!("failed to build RPC client: {}", e)))?;

            info!(
                network = %config.network_url,
                contract = %contract,
                sender = %identity.address(),
                chain_id = config.chain_id,
                "Connecting to ledger"
            );

            let gateway = gateway_for(Arc::new(client), config, contract, identity)?;
            let store = LedgerStore::new(gateway).with_health_timeout(config.health_timeout());
            store.health_check().await.map_err(|e| {
                StoreError::Initialization(format!("failed to connect to blockchain: {}", e))
            })?;

            Ok(Arc::new(store))
        }
    }
}

fn parse_contract(raw: &str) -> Result<Address, StoreError> {
    raw.parse::<Address>()
        .map_err(|e| StoreError::Initialization(format!("invalid contract address: {}", e)))
}

fn gateway_for(
    client: Arc<dyn LedgerClient>,
    config: &Config,
    contract: Address,
    identity: Identity,
) -> Result<ContractGateway, StoreError> {
    let interface = load_method_interface(config)?;
    Ok(ContractGateway::new(
        client,
        Arc::new(interface),
        contract,
        Arc::new(identity),
        config.chain_id,
    ))
}

fn parse_identity(key: &str) -> Result<Identity, StoreError> {
    Identity::from_hex(key)
        .map_err(|e| StoreError::Initialization(format!("invalid private key: {}", e)))
}

/// Read the configured artifact, falling back to the bundled interface when
/// the file is absent, and check it defines every method the store calls.
pub fn load_method_interface(config: &Config) -> Result<MethodInterface, StoreError> {
    let interface = if config.contract_json.exists() {
        info!(path = %config.contract_json.display(), "Loading contract interface");
        load_interface_file(&config.contract_json)
    } else {
        warn!(
            path = %config.contract_json.display(),
            "Contract artifact not found; using bundled ContentStorage interface"
        );
        MethodInterface::from_json_str(CONTENT_STORAGE_INTERFACE)
    }
    .map_err(|e| StoreError::Initialization(e.to_string()))?;

    let missing: Vec<&str> = REQUIRED_METHODS
        .iter()
        .copied()
        .filter(|name| interface.method(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::Initialization(format!(
            "contract interface lacks required methods: {}",
            missing.join(", ")
        )));
    }

    Ok(interface)
}
