//! In-memory record store
//!
//! Keeps every kind in process-local maps and never contacts a ledger.
//! Transaction tags are random placeholders. Used for local development
//! and as the reference behavior in tests.

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{creator_or_anonymous, parse_contest_window, RecordCache, RecordStore};
use crate::abi::Address;
use crate::error::StoreError;
use crate::ids::{new_id, new_tx_tag};
use crate::models::{
    Backing, ContentRecord, ContestRecord, ContestantRecord, ContestantsInContestResponse,
    CreateContentRequest, CreateContestRequest, CreateContestantRequest, CreateResponse,
    CreateSponsorRequest, GetResponse, ListResponse, RecordKind, RegisterContestantRequest,
    RegistrationRecord, SponsorRecord, StatsResponse,
};
use crate::normalize::matches_keyword;

pub struct MemoryStore {
    cache: RwLock<RecordCache>,
    /// Recorded as contest organizer and sponsor wallet.
    identity: String,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_identity(Address::ZERO.to_string())
    }

    pub fn with_identity(identity: impl Into<String>) -> Self {
        Self {
            cache: RwLock::new(RecordCache::new()),
            identity: identity.into(),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn backing(&self, _kind: RecordKind) -> Backing {
        Backing::InMemory
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

        debug!(content_id = %id, "Content stored in memory");
        Ok(CreateResponse::created("Content created successfully", Some(id), tx_hash))
    }

    async fn get_content(&self, id: &str) -> Result<GetResponse<ContentRecord>, StoreError> {
        Ok(match self.cache.read().await.content(id) {
            Some(record) => GetResponse::found(record.clone()),
            None => GetResponse::not_found("Content not found"),
        })
    }

    async fn list_contents(&self) -> Result<ListResponse<ContentRecord>, StoreError> {
        Ok(ListResponse::new(self.cache.read().await.contents()))
    }

    // ===== Contests =====

    async fn create_contest(&self, req: CreateContestRequest) -> Result<CreateResponse, StoreError> {
        let (start_date, end_date) = parse_contest_window(&req)?;

        let record = ContestRecord {
            id: new_id(),
            name: req.name,
            description: req.description,
            start_date: start_date.trunc_subsecs(0),
            end_date: end_date.trunc_subsecs(0),
            organizer: self.identity.clone(),
            active: true,
            image_url: req.image_url,
            tx_hash: new_tx_tag(),
            timestamp: Some(Utc::now()),
        };
        let (id, tx_hash) = (record.id.clone(), record.tx_hash.clone());
        self.cache.write().await.insert_contest(record);

        info!(contest_id = %id, "Contest created in memory");
        Ok(CreateResponse::created("Contest created successfully", Some(id), tx_hash))
    }

    async fn get_contest(&self, id: &str) -> Result<GetResponse<ContestRecord>, StoreError> {
        Ok(match self.cache.read().await.contest(id) {
            Some(record) => GetResponse::found(record.clone()),
            None => GetResponse::not_found("Contest not found"),
        })
    }

    async fn list_contests(&self) -> Result<ListResponse<ContestRecord>, StoreError> {
        Ok(ListResponse::new(self.cache.read().await.contests()))
    }

    async fn search_contests(&self, keyword: &str) -> Result<Vec<ContestRecord>, StoreError> {
        let contests = self.cache.read().await.contests();
        Ok(contests
            .into_iter()
            .filter(|c| {
                matches_keyword(
                    [
                        c.name.as_str(),
                        c.description.as_str(),
                        c.image_url.as_str(),
                        c.organizer.as_str(),
                    ],
                    keyword,
                )
            })
            .collect())
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
        Ok(CreateResponse::created("Contestant created successfully", Some(id), tx_hash))
    }

    async fn get_contestant(&self, id: &str) -> Result<GetResponse<ContestantRecord>, StoreError> {
        Ok(match self.cache.read().await.contestant(id) {
            Some(record) => GetResponse::found(record.clone()),
            None => GetResponse::not_found("Contestant not found"),
        })
    }

    async fn list_contestants(&self) -> Result<ListResponse<ContestantRecord>, StoreError> {
        Ok(ListResponse::new(self.cache.read().await.contestants()))
    }

    // ===== Sponsors =====

    async fn create_sponsor(&self, req: CreateSponsorRequest) -> Result<CreateResponse, StoreError> {
        let record = SponsorRecord {
            id: new_id(),
            name: req.name,
            contact_info: req.contact_info,
            sponsorship_amount: req.sponsorship_amount,
            wallet_address: self.identity.clone(),
            tx_hash: new_tx_tag(),
            timestamp: Utc::now(),
        };
        let (id, tx_hash) = (record.id.clone(), record.tx_hash.clone());
        self.cache.write().await.insert_sponsor(record);
        Ok(CreateResponse::created("Sponsor created successfully", Some(id), tx_hash))
    }

    async fn get_sponsor(&self, id: &str) -> Result<GetResponse<SponsorRecord>, StoreError> {
        Ok(match self.cache.read().await.sponsor(id) {
            Some(record) => GetResponse::found(record.clone()),
            None => GetResponse::not_found("Sponsor not found"),
        })
    }

    async fn list_sponsors(&self) -> Result<ListResponse<SponsorRecord>, StoreError> {
        Ok(ListResponse::new(self.cache.read().await.sponsors()))
    }

    // ===== Registrations =====

    async fn register_contestant(
        &self,
        req: RegisterContestantRequest,
    ) -> Result<CreateResponse, StoreError> {
        // Existence checks and insert happen under one write guard.
        let mut cache = self.cache.write().await;
        if cache.contest(&req.contest_id).is_none() {
            return Err(StoreError::NotFound {
                kind: "Contest",
                id: req.contest_id,
            });
        }
        if cache.contestant(&req.contestant_id).is_none() {
            return Err(StoreError::NotFound {
                kind: "Contestant",
                id: req.contestant_id,
            });
        }
        if cache.is_registered(&req.contest_id, &req.contestant_id) {
            return Err(StoreError::AlreadyRegistered {
                contest_id: req.contest_id,
                contestant_id: req.contestant_id,
            });
        }

        let tx_hash = new_tx_tag();
        cache.upsert_registration(RegistrationRecord {
            contest_id: req.contest_id,
            contestant_id: req.contestant_id,
            registered_at: Utc::now(),
            tx_hash: tx_hash.clone(),
        });
        Ok(CreateResponse::created(
            "Contestant registered successfully",
            None,
            tx_hash,
        ))
    }

    async fn contestants_in_contest(
        &self,
        contest_id: &str,
    ) -> Result<ContestantsInContestResponse, StoreError> {
        let cache = self.cache.read().await;
        if cache.contest(contest_id).is_none() {
            return Ok(ContestantsInContestResponse {
                success: false,
                message: "Contest not found".to_string(),
                contest_id: contest_id.to_string(),
                contestants: Vec::new(),
                total: 0,
            });
        }
        let contestants = cache.contestants_in(contest_id);
        Ok(ContestantsInContestResponse {
            success: true,
            message: String::new(),
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
            message: String::new(),
            data: Some(self.cache.read().await.statistics()),
        })
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{is_generated_id, is_tx_tag};
    use crate::models::Lookup;

    fn contest_request(name: &str) -> CreateContestRequest {
        CreateContestRequest {
            name: name.into(),
            description: "D".into(),
            start_date: "2025-07-05T00:00:00Z".into(),
            end_date: "2025-08-05T00:00:00Z".into(),
            image_url: String::new(),
        }
    }

    #[tokio::test]
    async fn contest_scenario() {
        let store = MemoryStore::new();
        let created = store.create_contest(contest_request("T")).await.unwrap();
        assert!(created.success);
        let id = created.id.clone().unwrap();
        assert!(is_generated_id(&id));
        assert!(is_tx_tag(created.tx_hash.as_deref().unwrap()));

        let fetched = store.get_contest(&id).await.unwrap();
        assert!(fetched.success);
        assert_eq!(fetched.data.unwrap().name, "T");
    }

    #[tokio::test]
    async fn registration_requires_both_sides_and_is_unique() {
        let store = MemoryStore::new();
        let contest = store.create_contest(contest_request("C")).await.unwrap().id.unwrap();
        let contestant = store
            .create_contestant(CreateContestantRequest {
                name: "Alice".into(),
                details: "painter".into(),
                creator: String::new(),
            })
            .await
            .unwrap()
            .id
            .unwrap();

        let missing = store
            .register_contestant(RegisterContestantRequest {
                contest_id: "nope".into(),
                contestant_id: contestant.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(missing, StoreError::NotFound { kind: "Contest", .. }));

        let missing = store
            .register_contestant(RegisterContestantRequest {
                contest_id: contest.clone(),
                contestant_id: "nobody".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(missing, StoreError::NotFound { kind: "Contestant", .. }));

        let req = RegisterContestantRequest {
            contest_id: contest.clone(),
            contestant_id: contestant.clone(),
        };
        let ok = store.register_contestant(req.clone()).await.unwrap();
        assert!(ok.success);
        assert!(ok.id.is_none());

        let dup = store.register_contestant(req).await.unwrap_err();
        assert!(matches!(dup, StoreError::AlreadyRegistered { .. }));

        assert!(store.is_contestant_registered(&contest, &contestant).await.unwrap());
        let listed = store.contestants_in_contest(&contest).await.unwrap();
        assert_eq!(listed.total, 1);
        assert_eq!(listed.contestants[0].creator, "anonymous");
    }

    #[tokio::test]
    async fn stats_count_every_kind() {
        let store = MemoryStore::new();
        store
            .create_content(CreateContentRequest {
                title: "t".into(),
                content: "c".into(),
                creator: "bob".into(),
            })
            .await
            .unwrap();
        store.create_contest(contest_request("C")).await.unwrap();
        store
            .create_sponsor(CreateSponsorRequest {
                name: "Acme".into(),
                contact_info: "acme@example.com".into(),
                sponsorship_amount: 500,
            })
            .await
            .unwrap();

        let stats = store.stats().await.unwrap().data.unwrap();
        assert_eq!(stats.total_contents, 1);
        assert_eq!(stats.total_contests, 1);
        assert_eq!(stats.total_sponsors, 1);
        assert_eq!(stats.total_contestants, 0);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = MemoryStore::new();
        let content = store.get_content("missing").await.unwrap();
        assert!(!content.success);
        assert_eq!(content.lookup, Lookup::NotFound);

        let listed = store.contestants_in_contest("missing").await.unwrap();
        assert!(!listed.success);
    }
}
