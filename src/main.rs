//! Contest Ledger Service
//!
//! ## Usage
//!
//! ```bash
//! # Against a real chain (values usually come from .env)
//! NETWORK_URL=https://rpc.ankr.com/polygon_mumbai CHAIN_ID=80001 \
//! CONTRACT_ADDRESS=0x... PRIVATE_KEY=0x... contest-ledger
//!
//! # Emulated contract, no node needed
//! contest-ledger --backend simulated
//!
//! # Everything in memory
//! contest-ledger --backend memory --port 9000
//!
//! # Settings from a file, overridden by flags and environment
//! contest-ledger --config contest-ledger.toml
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use contest_ledger::bootstrap::build_store;
use contest_ledger::http::API_PREFIX;
use contest_ledger::{Config, HttpServer, StoreBackend};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "contest-ledger")]
#[command(about = "Contest record service backed by a smart contract")]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP bind host
    #[arg(long, env = "HOST")]
    host: Option<String>,

    /// HTTP port
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Store backend: ledger, simulated or memory
    #[arg(long, env = "STORE_BACKEND")]
    backend: Option<StoreBackend>,

    /// Ledger JSON-RPC endpoint
    #[arg(long, env = "NETWORK_URL")]
    network_url: Option<String>,

    /// Chain id for transaction signing
    #[arg(long, env = "CHAIN_ID")]
    chain_id: Option<u64>,

    /// ContentStorage contract address
    #[arg(long, env = "CONTRACT_ADDRESS")]
    contract_address: Option<String>,

    /// Hex private key of the submitting account
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// Truffle artifact with the contract interface
    #[arg(long, env = "CONTRACT_JSON")]
    contract_json: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(url) = self.network_url {
            config.network_url = url;
        }
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if self.contract_address.is_some() {
            config.contract_address = self.contract_address;
        }
        if self.private_key.is_some() {
            config.private_key = self.private_key;
        }
        if let Some(path) = self.contract_json {
            config.contract_json = path;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("contest_ledger=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    args.apply(&mut config);

    info!(
        backend = %config.backend,
        network = %config.network_url,
        chain_id = config.chain_id,
        "Starting contest-ledger"
    );

    let store = build_store(&config)
        .await
        .context("Failed to initialize record store")?;

    let bind_addr: SocketAddr = tokio::net::lookup_host(config.bind_target())
        .await
        .with_context(|| format!("Cannot resolve {}", config.bind_target()))?
        .next()
        .with_context(|| format!("No address for {}", config.bind_target()))?;

    let server = Arc::new(HttpServer::new(store, bind_addr));
    info!(
        "API available at http://{}{}",
        config.bind_target(),
        API_PREFIX
    );

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
    };

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!(error = %e, "HTTP server error");
                return Err(e.into());
            }
        }
        _ = shutdown => {}
    }

    Ok(())
}
