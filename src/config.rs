//! Configuration for contest-ledger

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ledger::identity::PLACEHOLDER_PRIVATE_KEY;
use crate::store::StoreBackend;

/// Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Which store implementation to run
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    /// JSON-RPC endpoint of the ledger node
    #[serde(default = "default_network_url")]
    pub network_url: String,

    /// Chain id used for transaction signing
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,

    /// Deployed ContentStorage contract (0x-prefixed)
    #[serde(default)]
    pub contract_address: Option<String>,

    /// Hex private key of the submitting identity.
    /// Never written back by [`Config::save`].
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,

    /// Truffle artifact holding the contract's method interface.
    /// The bundled interface is used when the file does not exist.
    #[serde(default = "default_contract_json")]
    pub contract_json: PathBuf,

    /// Per-request timeout for ledger RPC calls
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Bound on the health check's block header fetch
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8081
}

fn default_backend() -> StoreBackend {
    StoreBackend::Ledger
}

fn default_network_url() -> String {
    "https://rpc.ankr.com/polygon_mumbai".to_string()
}

fn default_chain_id() -> u64 {
    80001
}

fn default_contract_json() -> PathBuf {
    PathBuf::from("../backend/truffle/build/contracts/ContentStorage.json")
}

fn default_request_timeout() -> u64 {
    30
}

fn default_health_timeout() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            backend: default_backend(),
            network_url: default_network_url(),
            chain_id: default_chain_id(),
            contract_address: None,
            private_key: None,
            contract_json: default_contract_json(),
            request_timeout_secs: default_request_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

impl Config {
    /// Load config from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save config to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), std::io::Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// `host:port` for the HTTP listener
    pub fn bind_target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    /// Configured private key, treating blanks and the sample value as unset.
    pub fn signing_key(&self) -> Option<&str> {
        self.private_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != PLACEHOLDER_PRIVATE_KEY)
    }

    /// Configured contract address, treating blanks as unset.
    pub fn contract(&self) -> Option<&str> {
        self.contract_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }

    /// Check the settings the chosen backend cannot start without.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be non-zero".to_string());
        }
        if self.backend == StoreBackend::Ledger {
            if self.signing_key().is_none() {
                return Err("private key is required".to_string());
            }
            if self.contract().is_none() {
                return Err("contract address is required".to_string());
            }
            if self.chain_id == 0 {
                return Err("chain id must be non-zero".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_mumbai() {
        let config = Config::default();
        assert_eq!(config.port, 8081);
        assert_eq!(config.chain_id, 80001);
        assert_eq!(config.backend, StoreBackend::Ledger);
        assert_eq!(config.bind_target(), "localhost:8081");
    }

    #[test]
    fn ledger_backend_needs_credentials() {
        let mut config = Config::default();
        assert_eq!(config.validate().unwrap_err(), "private key is required");

        config.private_key = Some(PLACEHOLDER_PRIVATE_KEY.to_string());
        assert_eq!(config.validate().unwrap_err(), "private key is required");

        config.private_key = Some("0xabc".to_string());
        assert_eq!(config.validate().unwrap_err(), "contract address is required");

        config.contract_address = Some("0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn memory_backend_needs_nothing() {
        let config = Config {
            backend: StoreBackend::Memory,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn save_omits_private_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config {
            private_key: Some("0xsecret".to_string()),
            backend: StoreBackend::Simulated,
            ..Config::default()
        };
        config.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("0xsecret"));
        assert!(raw.contains("backend = \"simulated\""));

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.backend, StoreBackend::Simulated);
        assert!(loaded.private_key.is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = toml::from_str("port = 9000\nbackend = \"memory\"").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.backend, StoreBackend::Memory);
    }
}
