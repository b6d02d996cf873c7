//! Record store
//!
//! [`RecordStore`] is the one interface the HTTP layer talks to. Two
//! implementations exist, chosen when the service starts:
//!
//! | Backend | Contests | Other kinds | Stats |
//! |---------|----------|-------------|-------|
//! | [`LedgerStore`] | contract storage via the gateway | local cache only | all zero |
//! | [`MemoryStore`] | in-process maps | in-process maps | live counts |
//!
//! Use [`RecordStore::backing`] to learn where a kind is kept. On the ledger
//! store, single-record getters for cache-only kinds answer with
//! [`Lookup::NotWiredOnChain`](crate::models::Lookup) rather than a plain
//! not-found.
//!
//! Validation (date format and ordering) runs before any ledger contact and
//! uses the same messages in both implementations.

pub mod cache;
pub mod ledger;
pub mod memory;

#[cfg(any(test, feature = "testutil"))]
pub mod conformance;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::{parse_rfc3339, RFC3339_EXAMPLE};
use crate::error::StoreError;
use crate::models::{
    Backing, ContentRecord, ContestRecord, ContestantRecord, ContestantsInContestResponse,
    CreateContentRequest, CreateContestRequest, CreateContestantRequest, CreateResponse,
    CreateSponsorRequest, GetResponse, ListResponse, RecordKind, RegisterContestantRequest,
    SponsorRecord, StatsResponse,
};

pub use cache::RecordCache;
pub use ledger::LedgerStore;
pub use memory::MemoryStore;

/// Creator recorded when a request leaves it blank.
pub const ANONYMOUS_CREATOR: &str = "anonymous";

/// Which implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Contract over JSON-RPC
    Ledger,
    /// Contract emulated in-process
    Simulated,
    /// No ledger at all
    Memory,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreBackend::Ledger => "ledger",
            StoreBackend::Simulated => "simulated",
            StoreBackend::Memory => "memory",
        })
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ledger" | "blockchain" => Ok(StoreBackend::Ledger),
            "simulated" => Ok(StoreBackend::Simulated),
            "memory" | "mock" => Ok(StoreBackend::Memory),
            other => Err(format!(
                "unknown store backend '{}' (expected ledger, simulated or memory)",
                other
            )),
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Where records of `kind` are kept.
    fn backing(&self, kind: RecordKind) -> Backing;

    // ===== Content =====

    async fn create_content(&self, req: CreateContentRequest) -> Result<CreateResponse, StoreError>;
    async fn get_content(&self, id: &str) -> Result<GetResponse<ContentRecord>, StoreError>;
    async fn list_contents(&self) -> Result<ListResponse<ContentRecord>, StoreError>;

    // ===== Contests =====

    async fn create_contest(&self, req: CreateContestRequest) -> Result<CreateResponse, StoreError>;
    async fn get_contest(&self, id: &str) -> Result<GetResponse<ContestRecord>, StoreError>;
    async fn list_contests(&self) -> Result<ListResponse<ContestRecord>, StoreError>;

    /// Contests whose name, description, image URL or organizer contain
    /// `keyword`, ignoring case and diacritics. Empty keyword matches all.
    async fn search_contests(&self, keyword: &str) -> Result<Vec<ContestRecord>, StoreError>;

    // ===== Contestants =====

    async fn create_contestant(
        &self,
        req: CreateContestantRequest,
    ) -> Result<CreateResponse, StoreError>;
    async fn get_contestant(&self, id: &str) -> Result<GetResponse<ContestantRecord>, StoreError>;
    async fn list_contestants(&self) -> Result<ListResponse<ContestantRecord>, StoreError>;

    // ===== Sponsors =====

    async fn create_sponsor(&self, req: CreateSponsorRequest) -> Result<CreateResponse, StoreError>;
    async fn get_sponsor(&self, id: &str) -> Result<GetResponse<SponsorRecord>, StoreError>;
    async fn list_sponsors(&self) -> Result<ListResponse<SponsorRecord>, StoreError>;

    // ===== Registrations =====

    async fn register_contestant(
        &self,
        req: RegisterContestantRequest,
    ) -> Result<CreateResponse, StoreError>;
    async fn contestants_in_contest(
        &self,
        contest_id: &str,
    ) -> Result<ContestantsInContestResponse, StoreError>;
    async fn is_contestant_registered(
        &self,
        contest_id: &str,
        contestant_id: &str,
    ) -> Result<bool, StoreError>;

    // ===== Service =====

    async fn stats(&self) -> Result<StatsResponse, StoreError>;
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Parse and order-check a contest's date window.
pub(crate) fn parse_contest_window(
    req: &CreateContestRequest,
) -> Result<(DateTime<Utc>, DateTime<Utc>), StoreError> {
    let start = parse_rfc3339(&req.start_date).ok_or_else(|| {
        StoreError::Validation(format!(
            "Invalid start date format. Use RFC3339 format: {}",
            RFC3339_EXAMPLE
        ))
    })?;
    let end = parse_rfc3339(&req.end_date).ok_or_else(|| {
        StoreError::Validation(format!(
            "Invalid end date format. Use RFC3339 format: {}",
            RFC3339_EXAMPLE
        ))
    })?;
    if end < start {
        return Err(StoreError::Validation(
            "End date must be after start date".to_string(),
        ));
    }
    Ok((start, end))
}

pub(crate) fn creator_or_anonymous(creator: String) -> String {
    if creator.trim().is_empty() {
        ANONYMOUS_CREATOR.to_string()
    } else {
        creator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: &str, end: &str) -> CreateContestRequest {
        CreateContestRequest {
            name: "T".into(),
            description: "D".into(),
            start_date: start.into(),
            end_date: end.into(),
            image_url: String::new(),
        }
    }

    #[test]
    fn window_messages_match_contract() {
        let err = parse_contest_window(&window("invalid-date", "2025-08-05T00:00:00Z")).unwrap_err();
        assert_eq!(
            err.user_message(),
            "Invalid start date format. Use RFC3339 format: 2006-01-02T15:04:05Z"
        );

        let err = parse_contest_window(&window("2025-07-05T00:00:00Z", "soon")).unwrap_err();
        assert_eq!(
            err.user_message(),
            "Invalid end date format. Use RFC3339 format: 2006-01-02T15:04:05Z"
        );

        let err = parse_contest_window(&window("2025-08-05T00:00:00Z", "2025-07-05T00:00:00Z"))
            .unwrap_err();
        assert_eq!(err.user_message(), "End date must be after start date");
    }

    #[test]
    fn equal_start_and_end_is_allowed() {
        assert!(parse_contest_window(&window("2025-07-05T00:00:00Z", "2025-07-05T00:00:00Z")).is_ok());
    }

    #[test]
    fn backend_parses_aliases() {
        assert_eq!("mock".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!("Ledger".parse::<StoreBackend>().unwrap(), StoreBackend::Ledger);
        assert!("sqlite".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn blank_creator_defaults() {
        assert_eq!(creator_or_anonymous("  ".into()), "anonymous");
        assert_eq!(creator_or_anonymous("alice".into()), "alice");
    }

    #[tokio::test]
    async fn memory_store_conformance() {
        conformance::run_all(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn ledger_store_conformance() {
        use crate::abi::{Address, MethodInterface, CONTENT_STORAGE_INTERFACE};
        use crate::gateway::ContractGateway;
        use crate::ledger::{Identity, SimulatedLedger};
        use std::sync::Arc;

        let ledger = Arc::new(SimulatedLedger::default());
        let interface = MethodInterface::from_json_str(CONTENT_STORAGE_INTERFACE).unwrap();
        let gateway = ContractGateway::new(
            ledger.clone(),
            Arc::new(interface),
            Address([0x11; 20]),
            Arc::new(Identity::random()),
            ledger.chain_id(),
        );
        let store: Arc<dyn RecordStore> = Arc::new(LedgerStore::new(gateway));
        conformance::run_all(store.as_ref()).await;
    }
}
