//! Canonical JSON for records stored on chain
//!
//! A contest is written to contract storage as one JSON object with exactly
//! these keys:
//!
//! ```json
//! {
//!   "id": "9f2c...",
//!   "name": "Summer Photo",
//!   "description": "...",
//!   "start_date": "2025-07-05T00:00:00Z",
//!   "end_date": "2025-08-05T00:00:00Z",
//!   "organizer": "0xAbC...",
//!   "image_url": "",
//!   "timestamp": "2025-07-01T10:00:00Z"
//! }
//! ```
//!
//! Timestamps are RFC3339 with whole seconds in UTC. Decoding rejects
//! missing keys, unknown keys, wrong types and malformed timestamps; it
//! never yields a partially filled record.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::StoreError;
use crate::models::ContestRecord;

/// Format accepted for user-supplied dates, used in validation messages.
pub const RFC3339_EXAMPLE: &str = "2006-01-02T15:04:05Z";

/// On-chain representation of a contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContestDocument {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(with = "rfc3339")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "rfc3339")]
    pub end_date: DateTime<Utc>,
    pub organizer: String,
    pub image_url: String,
    #[serde(with = "rfc3339")]
    pub timestamp: DateTime<Utc>,
}

impl ContestDocument {
    /// Build the on-chain form of a record. Sub-second precision is dropped.
    pub fn from_record(record: &ContestRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            start_date: record.start_date.trunc_subsecs(0),
            end_date: record.end_date.trunc_subsecs(0),
            organizer: record.organizer.clone(),
            image_url: record.image_url.clone(),
            timestamp: record
                .timestamp
                .unwrap_or_else(Utc::now)
                .trunc_subsecs(0),
        }
    }

    /// Domain record for this document. Stored contests are active.
    pub fn into_record(self, tx_hash: impl Into<String>) -> ContestRecord {
        ContestRecord {
            id: self.id,
            name: self.name,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            organizer: self.organizer,
            active: true,
            image_url: self.image_url,
            tx_hash: tx_hash.into(),
            timestamp: Some(self.timestamp),
        }
    }
}

/// Encode a contest document as pretty-printed JSON.
pub fn encode_contest(doc: &ContestDocument) -> Result<Vec<u8>, StoreError> {
    encode(doc)
}

/// Decode a contest document, failing with `MalformedRecord`.
pub fn decode_contest(bytes: &[u8]) -> Result<ContestDocument, StoreError> {
    decode(bytes)
}

/// Encode any record as pretty-printed JSON.
pub fn encode<T: Serialize>(record: &T) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec_pretty(record)?)
}

/// Decode any record, mapping every failure to `MalformedRecord`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::MalformedRecord(e.to_string()))
}

/// Strict RFC3339 parse of a user-supplied date.
pub fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Canonical timestamp text: whole seconds, `Z` suffix.
pub fn format_rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

mod rfc3339 {
    use super::*;

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format_rfc3339(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_rfc3339(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid RFC3339 timestamp: {}", raw))
        })
    }
}
