//! Conformance checks for [`RecordStore`] implementations.
//!
//! Each function exercises one part of the contest contract every backend
//! must honor. Run them against a fresh store:
//!
//! ```no_run
//! use contest_ledger::store::{conformance, MemoryStore};
//!
//! #[tokio::test]
//! async fn memory_store_conformance() {
//!     conformance::run_all(&MemoryStore::new()).await;
//! }
//! ```
//!
//! Only contests and content creation are covered. Lookups of the other
//! kinds legitimately differ between backends (see [`RecordStore::backing`]).

use crate::codec::parse_rfc3339;
use crate::models::{CreateContentRequest, CreateContestRequest, Lookup};

use super::RecordStore;

const START: &str = "2025-07-05T00:00:00Z";
const END: &str = "2025-08-05T00:00:00Z";

fn contest(name: &str, description: &str, start: &str, end: &str) -> CreateContestRequest {
    CreateContestRequest {
        name: name.to_string(),
        description: description.to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        image_url: String::new(),
    }
}

// ============================================================================
// Validation
// ============================================================================

/// A start date outside RFC3339 is rejected with the format hint.
pub async fn contest_rejects_malformed_start<S: RecordStore + ?Sized>(store: &S) {
    let err = store
        .create_contest(contest("T", "D", "invalid-date", END))
        .await
        .expect_err("malformed start must be rejected");
    assert_eq!(
        err.user_message(),
        "Invalid start date format. Use RFC3339 format: 2006-01-02T15:04:05Z"
    );
}

/// An end date outside RFC3339 is rejected with the format hint.
pub async fn contest_rejects_malformed_end<S: RecordStore + ?Sized>(store: &S) {
    let err = store
        .create_contest(contest("T", "D", START, "next week"))
        .await
        .expect_err("malformed end must be rejected");
    assert_eq!(
        err.user_message(),
        "Invalid end date format. Use RFC3339 format: 2006-01-02T15:04:05Z"
    );
}

/// End before start is rejected.
pub async fn contest_rejects_reversed_window<S: RecordStore + ?Sized>(store: &S) {
    let err = store
        .create_contest(contest("T", "D", END, START))
        .await
        .expect_err("reversed window must be rejected");
    assert_eq!(err.user_message(), "End date must be after start date");
}

/// A zero-length window is accepted.
pub async fn contest_accepts_equal_window<S: RecordStore + ?Sized>(store: &S) {
    let resp = store
        .create_contest(contest("Instant", "D", START, START))
        .await
        .expect("equal start and end is valid");
    assert!(resp.success);
}

// ============================================================================
// Contests
// ============================================================================

/// A created contest reads back with the submitted fields, active.
pub async fn contest_create_then_get<S: RecordStore + ?Sized>(store: &S) {
    let resp = store
        .create_contest(contest("Spring Cup", "Annual", START, END))
        .await
        .expect("create");
    assert!(resp.success);
    assert!(resp.tx_hash.as_deref().is_some_and(|t| !t.is_empty()));
    let id = resp.id.expect("created contest has an id");

    let got = store.get_contest(&id).await.expect("get");
    assert!(got.success, "created contest must be found: {}", got.message);
    assert_eq!(got.lookup, Lookup::Found);
    let record = got.data.expect("found response carries data");
    assert_eq!(record.id, id);
    assert_eq!(record.name, "Spring Cup");
    assert_eq!(record.description, "Annual");
    assert_eq!(crate::codec::format_rfc3339(&record.start_date), START);
    assert_eq!(crate::codec::format_rfc3339(&record.end_date), END);
    assert!(record.active);
}

/// Fractional seconds in the window are dropped on every backend.
pub async fn contest_window_drops_subseconds<S: RecordStore + ?Sized>(store: &S) {
    let resp = store
        .create_contest(contest(
            "Precise",
            "D",
            "2025-07-05T00:00:00.5Z",
            "2025-08-05T00:00:00.999+00:00",
        ))
        .await
        .expect("fractional seconds are valid RFC3339");
    let id = resp.id.expect("created contest has an id");

    let record = store
        .get_contest(&id)
        .await
        .expect("get")
        .data
        .expect("created contest is found");
    assert_eq!(Some(record.start_date), parse_rfc3339(START));
    assert_eq!(Some(record.end_date), parse_rfc3339(END));
}

/// Two identical requests create two contests.
pub async fn contest_identical_creates_are_distinct<S: RecordStore + ?Sized>(store: &S) {
    let a = store
        .create_contest(contest("Twin", "D", START, END))
        .await
        .expect("create");
    let b = store
        .create_contest(contest("Twin", "D", START, END))
        .await
        .expect("create");
    assert_ne!(a.id, b.id);
    assert_ne!(a.tx_hash, b.tx_hash);
}

/// An unknown id is a not-found response, not an error.
pub async fn contest_missing_is_not_found<S: RecordStore + ?Sized>(store: &S) {
    let got = store.get_contest("no-such-contest").await.expect("get");
    assert!(!got.success);
    assert_eq!(got.lookup, Lookup::NotFound);
    assert!(got.data.is_none());
}

/// Every created contest appears in the listing exactly once.
pub async fn contest_list_includes_created<S: RecordStore + ?Sized>(store: &S) {
    let before = store.list_contests().await.expect("list").total;
    let mut ids = Vec::new();
    for name in ["List A", "List B"] {
        let resp = store
            .create_contest(contest(name, "D", START, END))
            .await
            .expect("create");
        ids.push(resp.id.expect("id"));
    }

    let listed = store.list_contests().await.expect("list");
    assert!(listed.success);
    assert_eq!(listed.total, before + 2);
    assert_eq!(listed.total, listed.data.len());
    for id in &ids {
        assert_eq!(listed.data.iter().filter(|c| &c.id == id).count(), 1);
    }
}

// ============================================================================
// Search
// ============================================================================

/// Search ignores case and diacritics.
pub async fn search_folds_diacritics<S: RecordStore + ?Sized>(store: &S) {
    store
        .create_contest(contest("Cuộc thi Việt Nam", "Mùa hè", START, END))
        .await
        .expect("create");
    store
        .create_contest(contest("Unrelated", "Nothing here", START, END))
        .await
        .expect("create");

    let hits = store.search_contests("VIET").await.expect("search");
    assert!(hits.iter().any(|c| c.name == "Cuộc thi Việt Nam"));
    assert!(hits.iter().all(|c| c.name != "Unrelated"));

    let hits = store.search_contests("mua he").await.expect("search");
    assert!(hits.iter().any(|c| c.name == "Cuộc thi Việt Nam"));
}

/// An empty keyword matches every contest.
pub async fn search_empty_keyword_matches_all<S: RecordStore + ?Sized>(store: &S) {
    store
        .create_contest(contest("Any", "D", START, END))
        .await
        .expect("create");
    let all = store.list_contests().await.expect("list").total;
    let hits = store.search_contests("").await.expect("search");
    assert_eq!(hits.len(), all);
}

// ============================================================================
// Content and service
// ============================================================================

/// Content creation returns a fresh id and transaction tag each time.
pub async fn content_create_returns_fresh_ids<S: RecordStore + ?Sized>(store: &S) {
    let req = CreateContentRequest {
        title: "t".into(),
        content: "c".into(),
        creator: String::new(),
    };
    let a = store.create_content(req.clone()).await.expect("create");
    let b = store.create_content(req).await.expect("create");
    assert!(a.success && b.success);
    assert_ne!(a.id, b.id);
    assert_ne!(a.tx_hash, b.tx_hash);
}

/// A healthy store reports healthy.
pub async fn health_check_passes<S: RecordStore + ?Sized>(store: &S) {
    store.health_check().await.expect("healthy store");
}

/// Run every check in sequence against one store.
pub async fn run_all<S: RecordStore + ?Sized>(store: &S) {
    contest_rejects_malformed_start(store).await;
    contest_rejects_malformed_end(store).await;
    contest_rejects_reversed_window(store).await;
    contest_accepts_equal_window(store).await;

    contest_create_then_get(store).await;
    contest_window_drops_subseconds(store).await;
    contest_identical_creates_are_distinct(store).await;
    contest_missing_is_not_found(store).await;
    contest_list_includes_created(store).await;

    search_folds_diacritics(store).await;
    search_empty_keyword_matches_all(store).await;

    content_create_returns_fresh_ids(store).await;
    health_check_passes(store).await;
}
