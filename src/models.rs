//! Domain records, request payloads and response envelopes
//!
//! JSON field names match what API clients already send and receive
//! (`tx_hash`, `start_date`, `contact_info`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Records
// ============================================================================

/// A piece of submitted content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub creator: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tx_hash: String,
    pub verified: bool,
}

/// A contest. The only kind whose authoritative copy lives on chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub organizer: String,
    pub active: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tx_hash: String,
    /// Absent when the record was rebuilt from the contract's field getter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestantRecord {
    pub id: String,
    pub name: String,
    pub details: String,
    pub creator: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tx_hash: String,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SponsorRecord {
    pub id: String,
    pub name: String,
    pub contact_info: String,
    pub sponsorship_amount: u64,
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tx_hash: String,
    pub timestamp: DateTime<Utc>,
}

/// Links a contestant to a contest. Keyed by the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub contest_id: String,
    pub contestant_id: String,
    pub registered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tx_hash: String,
}

/// Record counts, computed on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_contents: u64,
    pub total_contests: u64,
    pub total_contestants: u64,
    pub total_sponsors: u64,
    pub total_registrations: u64,
}

/// The record kinds a store handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Content,
    Contest,
    Contestant,
    Sponsor,
    Registration,
}

impl RecordKind {
    pub fn label(&self) -> &'static str {
        match self {
            RecordKind::Content => "Content",
            RecordKind::Contest => "Contest",
            RecordKind::Contestant => "Contestant",
            RecordKind::Sponsor => "Sponsor",
            RecordKind::Registration => "Registration",
        }
    }
}

/// Where a store keeps a given record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backing {
    /// Authoritative copy in contract storage.
    OnChain,
    /// Process-local cache only; lost on restart.
    CacheOnly,
    /// Process-local maps; the whole store is in memory.
    InMemory,
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateContentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub creator: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateContestRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// RFC3339, e.g. `2025-07-05T00:00:00Z`
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateContestantRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub creator: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSponsorRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub sponsorship_amount: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterContestantRequest {
    #[serde(default)]
    pub contest_id: String,
    #[serde(default)]
    pub contestant_id: String,
}

// ============================================================================
// Responses
// ============================================================================

/// Result of any create or register operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl CreateResponse {
    pub fn created(message: impl Into<String>, id: Option<String>, tx_hash: String) -> Self {
        Self {
            success: true,
            message: message.into(),
            tx_hash: Some(tx_hash),
            id,
        }
    }
}

/// Outcome of a single-record lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    Found,
    NotFound,
    /// The store has no way to read this kind back from the ledger.
    NotWiredOnChain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub lookup: Lookup,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> GetResponse<T> {
    pub fn found(data: T) -> Self {
        Self {
            success: true,
            message: String::new(),
            lookup: Lookup::Found,
            data: Some(data),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            lookup: Lookup::NotFound,
            data: None,
        }
    }

    pub fn not_wired(kind: RecordKind) -> Self {
        Self {
            success: false,
            message: format!("{} not found on blockchain", kind.label()),
            lookup: Lookup::NotWiredOnChain,
            data: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub data: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            success: true,
            message: String::new(),
            total: data.len(),
            data,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestantsInContestResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub contest_id: String,
    pub contestants: Vec<ContestantRecord>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Statistics>,
}

/// Envelope for failed requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
        }
    }
}
