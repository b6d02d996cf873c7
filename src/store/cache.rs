//! Process-local record maps
//!
//! Owned by a single store instance and guarded by that store's lock.
//! Listings come back ordered by creation time, then id.

use std::collections::HashMap;

use crate::models::{
    ContentRecord, ContestRecord, ContestantRecord, RegistrationRecord, SponsorRecord, Statistics,
};

#[derive(Debug, Default)]
pub struct RecordCache {
    contents: HashMap<String, ContentRecord>,
    contests: HashMap<String, ContestRecord>,
    contestants: HashMap<String, ContestantRecord>,
    sponsors: HashMap<String, SponsorRecord>,
    registrations: HashMap<(String, String), RegistrationRecord>,
}

impl RecordCache {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== Content =====

    pub fn insert_content(&mut self, record: ContentRecord) {
        self.contents.insert(record.id.clone(), record);
    }

    pub fn content(&self, id: &str) -> Option<&ContentRecord> {
        self.contents.get(id)
    }

    pub fn contents(&self) -> Vec<ContentRecord> {
        let mut out: Vec<_> = self.contents.values().cloned().collect();
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        out
    }

    // ===== Contests =====

    pub fn insert_contest(&mut self, record: ContestRecord) {
        self.contests.insert(record.id.clone(), record);
    }

    pub fn contest(&self, id: &str) -> Option<&ContestRecord> {
        self.contests.get(id)
    }

    pub fn contests(&self) -> Vec<ContestRecord> {
        let mut out: Vec<_> = self.contests.values().cloned().collect();
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        out
    }

    // ===== Contestants =====

    pub fn insert_contestant(&mut self, record: ContestantRecord) {
        self.contestants.insert(record.id.clone(), record);
    }

    pub fn contestant(&self, id: &str) -> Option<&ContestantRecord> {
        self.contestants.get(id)
    }

    pub fn contestants(&self) -> Vec<ContestantRecord> {
        let mut out: Vec<_> = self.contestants.values().cloned().collect();
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        out
    }

    // ===== Sponsors =====

    pub fn insert_sponsor(&mut self, record: SponsorRecord) {
        self.sponsors.insert(record.id.clone(), record);
    }

    pub fn sponsor(&self, id: &str) -> Option<&SponsorRecord> {
        self.sponsors.get(id)
    }

    pub fn sponsors(&self) -> Vec<SponsorRecord> {
        let mut out: Vec<_> = self.sponsors.values().cloned().collect();
        out.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
        out
    }

    // ===== Registrations =====

    /// Insert or replace the registration for its pair. Returns the
    /// previous registration, if any.
    pub fn upsert_registration(&mut self, record: RegistrationRecord) -> Option<RegistrationRecord> {
        let key = (record.contest_id.clone(), record.contestant_id.clone());
        self.registrations.insert(key, record)
    }

    pub fn is_registered(&self, contest_id: &str, contestant_id: &str) -> bool {
        self.registrations
            .contains_key(&(contest_id.to_string(), contestant_id.to_string()))
    }

    /// Registrations for a contest, oldest first.
    pub fn registrations_for(&self, contest_id: &str) -> Vec<RegistrationRecord> {
        let mut out: Vec<_> = self
            .registrations
            .values()
            .filter(|r| r.contest_id == contest_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.contestant_id.cmp(&b.contestant_id))
        });
        out
    }

    /// Contestant records registered for a contest. Registrations whose
    /// contestant is not cached are left out.
    pub fn contestants_in(&self, contest_id: &str) -> Vec<ContestantRecord> {
        self.registrations_for(contest_id)
            .iter()
            .filter_map(|r| self.contestants.get(&r.contestant_id).cloned())
            .collect()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            total_contents: self.contents.len() as u64,
            total_contests: self.contests.len() as u64,
            total_contestants: self.contestants.len() as u64,
            total_sponsors: self.sponsors.len() as u64,
            total_registrations: self.registrations.len() as u64,
        }
    }
}
