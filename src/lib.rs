//! Contest Ledger - contest records backed by a smart contract
//!
//! An HTTP service for content items, contests, contestants, sponsors and
//! contest registrations. Contests are written to and read from a
//! `ContentStorage` contract on an EVM-style chain; the other kinds are
//! held locally until the contract grows methods for them.
//!
//! ## Architecture
//!
//! ```text
//! HTTP (/api/v1) ──> RecordStore ──> ContractGateway ──> LedgerClient
//!                     │                 │                 ├─ JsonRpcLedger
//!                     │                 │                 └─ SimulatedLedger
//!                     │                 └─ method interface (ABI)
//!                     └─ RecordCache (cache-only kinds)
//! ```
//!
//! ## Backends
//!
//! | Backend | Ledger | Use |
//! |---------|--------|-----|
//! | `ledger` | JSON-RPC node | production |
//! | `simulated` | in-process contract | local runs, tests |
//! | `memory` | none | development |

pub mod abi;
pub mod bootstrap;
pub mod codec;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod ids;
pub mod ledger;
pub mod models;
pub mod normalize;
pub mod store;

// Re-exports
pub use abi::{Address, MethodInterface};
pub use config::Config;
pub use error::{GatewayError, LedgerError, StoreError};
pub use gateway::ContractGateway;
pub use http::HttpServer;
pub use ledger::{JsonRpcLedger, LedgerClient, SimulatedLedger};
pub use store::{LedgerStore, MemoryStore, RecordStore, StoreBackend};
