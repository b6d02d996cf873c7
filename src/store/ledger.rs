//! Ledger-backed record store
//!
//! Contests are written to and read from contract storage through the
//! [`ContractGateway`]:
//!
//! - create: `createContestJson(id, json)`
//! - get: `getContestJsonById(id)` (empty string means absent)
//! - list: `getAllContestIds()` then `getContest(id)` per id
//! - search: `getAllContestIds()` then `getContestJsonById(id)` per id
//!
//! Content, contestants, sponsors and registrations have no contract
//! methods yet. They are kept in a local cache only, are lost on restart,
//! and their single-record getters report
//! [`Lookup::NotWiredOnChain`](crate::models::Lookup). Statistics are
//! always zero.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::{creator_or_anonymous, parse_contest_window, RecordCache, RecordStore};
use crate::codec::{self, ContestDocument};
use crate::error::{GatewayError, StoreError};
use crate::gateway::{ContractGateway, ViewOutput};
use crate::ids::{new_id, new_tx_tag};
use crate::models::{
    Backing, ContentRecord, ContestRecord, ContestantRecord, ContestantsInContestResponse,
    CreateContentRequest, CreateContestRequest, CreateContestantRequest, CreateResponse,
    CreateSponsorRequest, GetResponse, ListResponse, RecordKind, RegisterContestantRequest,
    RegistrationRecord, SponsorRecord, StatsResponse, Statistics,
};
use crate::normalize::matches_keyword;

pub const CREATE_CONTEST_JSON: &str = "createContestJson";
pub const GET_CONTEST_JSON: &str = "getContestJsonById";
pub const GET_ALL_CONTEST_IDS: &str = "getAllContestIds";
pub const GET_CONTEST: &str = "getContest";

/// Default bound on the health check's header fetch.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

const CACHE_ONLY_NOTE: &str = "cached locally, not recorded on chain";

pub struct LedgerStore {
    gateway: ContractGateway,
    cache: RwLock<RecordCache>,
    health_timeout: Duration,
}

impl LedgerStore {
    pub fn new(gateway: ContractGateway) -> Self {
        Self {
            gateway,
            cache: RwLock::new(RecordCache::new()),
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn gateway(&self) -> &ContractGateway {
        &self.gateway
    }

    async fn contest_ids(&self) -> Result<Vec<String>, StoreError> {
        self.gateway
            .call_view(GET_ALL_CONTEST_IDS, &[])
            .await
            .and_then(|out| out.string_list(0))
            .map_err(|e| {
                error!(error = %e, "Failed to list contest ids");
                StoreError::gateway("Failed to get contest IDs from blockchain", e)
            })
    }

    /// Decoded contest JSON for `id`, or `None` when the contract has none.
    async fn contest_document(&self, id: &str) -> Result<Option<ContestDocument>, StoreError> {
        let json = self
            .gateway
            .call_view(GET_CONTEST_JSON, &[id.into()])
            .await
            .and_then(|out| out.string(0))
            .map_err(|e| StoreError::gateway("Failed to get contest from blockchain", e))?;
        if json.is_empty() {
            return Ok(None);
        }
        codec::decode_contest(json.as_bytes()).map(Some)
    }
}

/// Rebuild a contest from the contract's field getter:
/// `(name, description, start, end, organizer, active, image_url)`.
fn contest_from_fields(id: &str, out: &ViewOutput) -> Result<ContestRecord, GatewayError> {
    let epoch = |index: usize| -> Result<DateTime<Utc>, GatewayError> {
        let secs = out.uint(index)?;
        i64::try_from(secs)
            .ok()
            .and_then(|s| Utc.timestamp_opt(s, 0).single())
            .ok_or_else(|| GatewayError::Decode {
                method: GET_CONTEST.to_string(),
                reason: format!("timestamp {} out of range", secs),
            })
    };

    Ok(ContestRecord {
        id: id.to_string(),
        name: out.string(0)?,
        description: out.string(1)?,
        start_date: epoch(2)?,
        end_date: epoch(3)?,
        organizer: out.address(4)?.to_string(),
        active: out.bool(5)?,
        image_url: out.string(6)?,
        tx_hash: String::new(),
        timestamp: None,
    })
}

#[async_trait]
impl RecordStore for LedgerStore {
    fn backing(&self, kind: RecordKind) -> Backing {
        match kind {
            RecordKind::Contest => Backing::OnChain,
            _ => Backing::CacheOnly,
        }
    }

    // ===== Content =====

    async fn create_content(&self, req: CreateContentRequest) -> Result<CreateResponse, StoreError> {
        let record = ContentRecord {
            id: new_id(),
            title: req.title,
            content: req.content,
            creator: creator_or_anonymous(req.creator),
            timestamp: Utc::now(),
            tx_hash: new_tx_tag(),
            verified: true,
        };
        let (id, tx_hash) = (record.id.clone(), record.tx_hash.clone());
        self.cache.write().await.insert_content(record);

        debug!(content_id = %id, "Content cached locally");
        Ok(CreateResponse::created(
            format!("Content created successfully ({})", CACHE_ONLY_NOTE),
            Some(id),
            tx_hash,
        ))
    }

    async fn get_content(&self, _id: &str) -> Result<GetResponse<ContentRecord>, StoreError> {
        Ok(GetResponse::not_wired(RecordKind::Content))
    }

    async fn list_contents(&self) -> Result<ListResponse<ContentRecord>, StoreError> {
        Ok(ListResponse::new(self.cache.read().await.contents())
            .with_message("served from local cache; not enumerable on chain"))
    }

    // ===== Contests =====

    async fn create_contest(&self, req: CreateContestRequest) -> Result<CreateResponse, StoreError> {
        let (start_date, end_date) = parse_contest_window(&req)?;

        let doc = ContestDocument {
            id: new_id(),
            name: req.name,
            description: req.description,
            start_date: start_date.trunc_subsecs(0),
            end_date: end_date.trunc_subsecs(0),
            organizer: self.gateway.sender().to_string(),
            image_url: req.image_url,
            timestamp: Utc::now().trunc_subsecs(0),
        };
        let json = String::from_utf8(codec::encode_contest(&doc)?)
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        match self
            .gateway
            .submit(CREATE_CONTEST_JSON, &[doc.id.clone().into(), json.into()])
            .await
        {
            Ok(tx_hash) => {
                info!(contest_id = %doc.id, tx_hash = %tx_hash, "Contest submitted to chain");
                Ok(CreateResponse::created(
                    "Contest created successfully on blockchain",
                    Some(doc.id),
                    tx_hash,
                ))
            }
            Err(e) => {
                error!(contest_id = %doc.id, error = %e, "Contest submission failed");
                Err(StoreError::gateway("Failed to create contest on blockchain", e))
            }
        }
    }

    async fn get_contest(&self, id: &str) -> Result<GetResponse<ContestRecord>, StoreError> {
        Ok(match self.contest_document(id).await? {
            Some(doc) => GetResponse::found(doc.into_record(String::new())),
            None => GetResponse::not_found("Contest not found on blockchain"),
        })
    }

    async fn list_contests(&self) -> Result<ListResponse<ContestRecord>, StoreError> {
        let ids = self.contest_ids().await?;
        let mut contests = Vec::with_capacity(ids.len());

        for id in ids {
            let fetched = self
                .gateway
                .call_view(GET_CONTEST, &[id.as_str().into()])
                .await
                .and_then(|out| contest_from_fields(&id, &out));
            match fetched {
                Ok(contest) => contests.push(contest),
                Err(e) => warn!(contest_id = %id, error = %e, "Skipping unreadable contest"),
            }
        }

        Ok(ListResponse::new(contests))
    }

    async fn search_contests(&self, keyword: &str) -> Result<Vec<ContestRecord>, StoreError> {
        let ids = self.contest_ids().await?;
        let mut matches = Vec::new();

        for id in ids {
            let doc = match self.contest_document(&id).await {
                Ok(Some(doc)) => doc,
                Ok(None) => continue,
                Err(e) => {
                    debug!(contest_id = %id, error = %e, "Search skipped contest");
                    continue;
                }
            };
            let hit = matches_keyword(
                [
                    doc.name.as_str(),
                    doc.description.as_str(),
                    doc.image_url.as_str(),
                    doc.organizer.as_str(),
                ],
                keyword,
            );
            if hit {
                matches.push(doc.into_record(String::new()));
            }
        }

        Ok(matches)
    }

    // ===== Contestants =====

    async fn create_contestant(
        &self,
        req: CreateContestantRequest,
    ) -> Result<CreateResponse, StoreError> {
        let record = ContestantRecord {
            id: new_id(),
            name: req.name,
            details: req.details,
            creator: creator_or_anonymous(req.creator),
            timestamp: Utc::now(),
            tx_hash: new_tx_tag(),
            verified: true,
        };
        let (id, tx_hash) = (record.id.clone(), record.tx_hash.clone());
        self.cache.write().await.insert_contestant(record);
        Ok(CreateResponse::created(
            format!("Contestant created successfully ({})", CACHE_ONLY_NOTE),
            Some(id),
            tx_hash,
        ))
    }

    async fn get_contestant(&self, _id: &str) -> Result<GetResponse<ContestantRecord>, StoreError> {
        Ok(GetResponse::not_wired(RecordKind::Contestant))
    }

    async fn list_contestants(&self) -> Result<ListResponse<ContestantRecord>, StoreError> {
        Ok(ListResponse::new(self.cache.read().await.contestants())
            .with_message("served from local cache; not enumerable on chain"))
    }

    // ===== Sponsors =====

    async fn create_sponsor(&self, req: CreateSponsorRequest) -> Result<CreateResponse, StoreError> {
        let record = SponsorRecord {
            id: new_id(),
            name: req.name,
            contact_info: req.contact_info,
            sponsorship_amount: req.sponsorship_amount,
            wallet_address: self.gateway.sender().to_string(),
            tx_hash: new_tx_tag(),
            timestamp: Utc::now(),
        };
        let (id, tx_hash) = (record.id.clone(), record.tx_hash.clone());
        self.cache.write().await.insert_sponsor(record);
        Ok(CreateResponse::created(
            format!("Sponsor created successfully ({})", CACHE_ONLY_NOTE),
            Some(id),
            tx_hash,
        ))
    }

    async fn get_sponsor(&self, _id: &str) -> Result<GetResponse<SponsorRecord>, StoreError> {
        Ok(GetResponse::not_wired(RecordKind::Sponsor))
    }

    async fn list_sponsors(&self) -> Result<ListResponse<SponsorRecord>, StoreError> {
        Ok(ListResponse::new(self.cache.read().await.sponsors())
            .with_message("served from local cache; not enumerable on chain"))
    }

    // ===== Registrations =====

    async fn register_contestant(
        &self,
        req: RegisterContestantRequest,
    ) -> Result<CreateResponse, StoreError> {
        // Neither side is checked: contests live on chain and contestants
        // are cache-only, so a registration is recorded as given.
        let tx_hash = new_tx_tag();
        self.cache.write().await.upsert_registration(RegistrationRecord {
            contest_id: req.contest_id,
            contestant_id: req.contestant_id,
            registered_at: Utc::now(),
            tx_hash: tx_hash.clone(),
        });
        Ok(CreateResponse::created(
            format!("Contestant registered successfully ({})", CACHE_ONLY_NOTE),
            None,
            tx_hash,
        ))
    }

    async fn contestants_in_contest(
        &self,
        contest_id: &str,
    ) -> Result<ContestantsInContestResponse, StoreError> {
        let contestants = self.cache.read().await.contestants_in(contest_id);
        Ok(ContestantsInContestResponse {
            success: true,
            message: "served from local cache; not enumerable on chain".to_string(),
            contest_id: contest_id.to_string(),
            total: contestants.len(),
            contestants,
        })
    }

    async fn is_contestant_registered(
        &self,
        contest_id: &str,
        contestant_id: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.cache.read().await.is_registered(contest_id, contestant_id))
    }

    // ===== Service =====

    async fn stats(&self) -> Result<StatsResponse, StoreError> {
        Ok(StatsResponse {
            success: true,
            message: "Statistics are not tracked on chain".to_string(),
            data: Some(Statistics::default()),
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let header = self
            .gateway
            .latest_header(self.health_timeout)
            .await
            .map_err(|e| StoreError::gateway("Blockchain connection failed", e))?;
        debug!(block = header.number, "Ledger reachable");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{AbiValue, Address, MethodInterface, CONTENT_STORAGE_INTERFACE};
    use crate::error::LedgerError;
    use crate::ledger::simulated::{Fault, SimulatedLedger, DEFAULT_CHAIN_ID};
    use crate::ledger::Identity;
    use crate::models::Lookup;
    use std::sync::Arc;

    fn store_over(ledger: Arc<SimulatedLedger>) -> LedgerStore {
        let interface = MethodInterface::from_json_str(CONTENT_STORAGE_INTERFACE).unwrap();
        LedgerStore::new(ContractGateway::new(
            ledger,
            Arc::new(interface),
            Address([0x42; 20]),
            Arc::new(Identity::random()),
            DEFAULT_CHAIN_ID,
        ))
    }

    fn contest_request(name: &str, start: &str, end: &str) -> CreateContestRequest {
        CreateContestRequest {
            name: name.into(),
            description: "D".into(),
            start_date: start.into(),
            end_date: end.into(),
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn reversed_dates_never_reach_ledger() {
        let ledger = Arc::new(SimulatedLedger::default());
        let store = store_over(ledger.clone());

        let err = store
            .create_contest(contest_request("T", "2025-08-05T00:00:00Z", "2025-07-05T00:00:00Z"))
            .await
            .unwrap_err();
        assert!(err.user_message().contains("End date must be after start date"));
        assert_eq!(ledger.transactions(), 0);
        assert_eq!(ledger.view_calls(), 0);
    }

    #[tokio::test]
    async fn malformed_start_date_never_reaches_ledger() {
        let ledger = Arc::new(SimulatedLedger::default());
        let store = store_over(ledger.clone());

        let err = store
            .create_contest(contest_request("T", "invalid-date", "2025-07-05T00:00:00Z"))
            .await
            .unwrap_err();
        assert!(err.user_message().contains("Invalid start date format"));
        assert_eq!(ledger.transactions(), 0);
    }

    #[tokio::test]
    async fn submission_failure_is_reported() {
        let ledger = Arc::new(SimulatedLedger::default());
        ledger
            .inject_fault(
                CREATE_CONTEST_JSON,
                None,
                Fault::Fail(LedgerError::Rpc {
                    code: -32000,
                    message: "insufficient funds for gas".into(),
                }),
            )
            .await;
        let store = store_over(ledger.clone());

        let err = store
            .create_contest(contest_request("T", "2025-07-05T00:00:00Z", "2025-08-05T00:00:00Z"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed to create contest on blockchain");
        assert!(err.to_string().contains("insufficient funds"));
        assert_eq!(ledger.transactions(), 1);
    }

    #[tokio::test]
    async fn created_contest_carries_identity_as_organizer() {
        let ledger = Arc::new(SimulatedLedger::default());
        let store = store_over(ledger);

        let created = store
            .create_contest(contest_request("T", "2025-07-05T00:00:00Z", "2025-08-05T00:00:00Z"))
            .await
            .unwrap();
        let id = created.id.unwrap();

        let fetched = store.get_contest(&id).await.unwrap().data.unwrap();
        assert_eq!(fetched.organizer, store.gateway().sender().to_string());
        assert!(fetched.active);
        assert!(fetched.timestamp.is_some());

        let listed = store.list_contests().await.unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.data[0].start_date, fetched.start_date);
        assert!(listed.data[0].timestamp.is_none());
    }

    #[tokio::test]
    async fn list_skips_failing_and_misshapen_contests() {
        let ledger = Arc::new(SimulatedLedger::default());
        let store = store_over(ledger.clone());
        let window = ("2025-07-05T00:00:00Z", "2025-08-05T00:00:00Z");

        let mut ids = Vec::new();
        for name in ["good", "broken", "short"] {
            let resp = store
                .create_contest(contest_request(name, window.0, window.1))
                .await
                .unwrap();
            ids.push(resp.id.unwrap());
        }

        ledger
            .inject_fault(
                GET_CONTEST,
                Some(&ids[1]),
                Fault::Fail(LedgerError::Reverted("storage corrupted".into())),
            )
            .await;
        ledger
            .inject_fault(
                GET_CONTEST,
                Some(&ids[2]),
                Fault::Respond(vec![
                    AbiValue::from("short"),
                    AbiValue::from("D"),
                    AbiValue::Uint(1),
                    AbiValue::Uint(2),
                    AbiValue::Address(Address::ZERO),
                    AbiValue::Bool(true),
                ]),
            )
            .await;

        let listed = store.list_contests().await.unwrap();
        assert!(listed.success);
        assert_eq!(listed.total, 1);
        assert_eq!(listed.data[0].name, "good");
    }

    #[tokio::test]
    async fn id_listing_failure_is_an_error() {
        let ledger = Arc::new(SimulatedLedger::default());
        ledger
            .inject_fault(
                GET_ALL_CONTEST_IDS,
                None,
                Fault::Fail(LedgerError::Transport("connection reset".into())),
            )
            .await;
        let store = store_over(ledger);

        assert!(store.list_contests().await.is_err());
        assert!(store.search_contests("x").await.is_err());
    }

    #[tokio::test]
    async fn search_excludes_undecodable_records() {
        let ledger = Arc::new(SimulatedLedger::default());
        let store = store_over(ledger.clone());
        store
            .create_contest(contest_request(
                "Cuộc thi Việt Nam",
                "2025-07-05T00:00:00Z",
                "2025-08-05T00:00:00Z",
            ))
            .await
            .unwrap();
        ledger.seed_contest_json("garbage", "{\"name\": \"Viet\"").await;

        let hits = store.search_contests("viet").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Cuộc thi Việt Nam");

        let err = store.get_contest("garbage").await.unwrap_err();
        assert!(matches!(err, StoreError::MalformedRecord(_)));
    }

    #[tokio::test]
    async fn cache_only_kinds_are_flagged() {
        let ledger = Arc::new(SimulatedLedger::default());
        let store = store_over(ledger.clone());

        let created = store
            .create_content(CreateContentRequest {
                title: "t".into(),
                content: "c".into(),
                creator: String::new(),
            })
            .await
            .unwrap();
        assert!(created.success);
        assert_eq!(ledger.transactions(), 0);

        let got = store.get_content(created.id.as_deref().unwrap()).await.unwrap();
        assert!(!got.success);
        assert_eq!(got.lookup, Lookup::NotWiredOnChain);
        assert_eq!(got.message, "Content not found on blockchain");

        assert_eq!(store.backing(RecordKind::Content), Backing::CacheOnly);
        assert_eq!(store.backing(RecordKind::Contest), Backing::OnChain);
        assert_eq!(store.list_contents().await.unwrap().total, 1);
        assert_eq!(store.stats().await.unwrap().data.unwrap(), Statistics::default());
    }

    #[tokio::test]
    async fn registration_is_unchecked() {
        let store = store_over(Arc::new(SimulatedLedger::default()));
        let resp = store
            .register_contestant(RegisterContestantRequest {
                contest_id: "any".into(),
                contestant_id: "one".into(),
            })
            .await
            .unwrap();
        assert!(resp.success);
        assert!(store.is_contestant_registered("any", "one").await.unwrap());
    }

    #[tokio::test]
    async fn health_check_follows_node() {
        let ledger = Arc::new(SimulatedLedger::default());
        let store = store_over(ledger.clone());
        assert!(store.health_check().await.is_ok());

        ledger.set_offline(true).await;
        let err = store.health_check().await.unwrap_err();
        assert_eq!(err.user_message(), "Blockchain connection failed");
    }
}
