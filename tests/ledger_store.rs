//! Integration tests for the ledger-backed store
//!
//! Runs the store and gateway against the in-process contract, counting
//! every call that reaches the ledger.

use contest_ledger::abi::{AbiValue, Address, MethodInterface, CONTENT_STORAGE_INTERFACE};
use contest_ledger::ids::{is_generated_id, is_tx_tag};
use contest_ledger::ledger::simulated::{Fault, DEFAULT_CHAIN_ID};
use contest_ledger::ledger::Identity;
use contest_ledger::models::CreateContestRequest;
use contest_ledger::{
    ContractGateway, LedgerError, LedgerStore, MemoryStore, RecordStore, SimulatedLedger,
};
use std::sync::Arc;

fn store_with_chain(ledger: Arc<SimulatedLedger>, chain_id: u64) -> LedgerStore {
    let interface = MethodInterface::from_json_str(CONTENT_STORAGE_INTERFACE).unwrap();
    LedgerStore::new(ContractGateway::new(
        ledger,
        Arc::new(interface),
        Address([0x5f; 20]),
        Arc::new(Identity::random()),
        chain_id,
    ))
}

fn request(name: &str, start: &str, end: &str) -> CreateContestRequest {
    CreateContestRequest {
        name: name.to_string(),
        description: "D".to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        image_url: String::new(),
    }
}

/// Same payload twice yields two contests.
#[tokio::test]
async fn test_identical_creates_are_distinct() {
    let ledger = Arc::new(SimulatedLedger::default());
    let store = store_with_chain(ledger.clone(), DEFAULT_CHAIN_ID);

    let a = store
        .create_contest(request("T", "2025-07-05T00:00:00Z", "2025-08-05T00:00:00Z"))
        .await
        .unwrap();
    let b = store
        .create_contest(request("T", "2025-07-05T00:00:00Z", "2025-08-05T00:00:00Z"))
        .await
        .unwrap();

    assert_ne!(a.id, b.id);
    assert_ne!(a.tx_hash, b.tx_hash);
    assert!(is_generated_id(a.id.as_deref().unwrap()));
    assert!(is_tx_tag(a.tx_hash.as_deref().unwrap()));
    assert_eq!(ledger.transactions(), 2);
    assert_eq!(store.list_contests().await.unwrap().total, 2);
}

/// Validation failures never touch the ledger.
#[tokio::test]
async fn test_rejected_contests_make_no_calls() {
    let ledger = Arc::new(SimulatedLedger::default());
    let store = store_with_chain(ledger.clone(), DEFAULT_CHAIN_ID);

    assert!(store
        .create_contest(request("T", "2025-08-05T00:00:00Z", "2025-07-05T00:00:00Z"))
        .await
        .is_err());
    let err = store
        .create_contest(request("T", "invalid-date", "2025-07-05T00:00:00Z"))
        .await
        .unwrap_err();
    assert!(err.user_message().contains("Invalid start date format"));

    assert_eq!(ledger.transactions(), 0);
    assert_eq!(ledger.view_calls(), 0);
}

/// A node on another chain rejects the signed submission.
#[tokio::test]
async fn test_chain_id_mismatch_fails_create() {
    let ledger = Arc::new(SimulatedLedger::new(5));
    let store = store_with_chain(ledger, 6);

    let err = store
        .create_contest(request("T", "2025-07-05T00:00:00Z", "2025-08-05T00:00:00Z"))
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "Failed to create contest on blockchain");
    assert!(err.to_string().contains("invalid chain id"));
}

/// Listing survives per-id failures and misshapen tuples.
#[tokio::test]
async fn test_list_tolerates_bad_entries() {
    let ledger = Arc::new(SimulatedLedger::default());
    let store = store_with_chain(ledger.clone(), DEFAULT_CHAIN_ID);

    let mut ids = Vec::new();
    for name in ["one", "two", "three"] {
        let resp = store
            .create_contest(request(name, "2025-07-05T00:00:00Z", "2025-08-05T00:00:00Z"))
            .await
            .unwrap();
        ids.push(resp.id.unwrap());
    }

    ledger
        .inject_fault(
            "getContest",
            Some(&ids[0]),
            Fault::Fail(LedgerError::Transport("connection reset".into())),
        )
        .await;
    ledger
        .inject_fault(
            "getContest",
            Some(&ids[1]),
            Fault::Respond(vec![AbiValue::Bool(true)]),
        )
        .await;

    let listed = store.list_contests().await.unwrap();
    assert!(listed.success);
    assert_eq!(listed.total, 1);
    assert_eq!(listed.data[0].id, ids[2]);

    ledger.clear_faults().await;
    assert_eq!(store.list_contests().await.unwrap().total, 3);
}

/// A panicking node surfaces as an error, not a crash.
#[tokio::test]
async fn test_panicking_ledger_is_contained() {
    let ledger = Arc::new(SimulatedLedger::default());
    ledger
        .inject_fault("getContestJsonById", None, Fault::Panic("boom".into()))
        .await;
    let store = store_with_chain(ledger, DEFAULT_CHAIN_ID);

    assert!(store.get_contest("anything").await.is_err());
}

/// Memory store scenario: create then read back.
#[tokio::test]
async fn test_memory_scenario() {
    let store = MemoryStore::new();
    let created = store
        .create_contest(request("T", "2025-07-05T00:00:00Z", "2025-08-05T00:00:00Z"))
        .await
        .unwrap();
    assert!(created.success);
    let id = created.id.unwrap();
    assert!(is_generated_id(&id));
    assert!(is_tx_tag(created.tx_hash.as_deref().unwrap()));

    let got = store.get_contest(&id).await.unwrap();
    assert!(got.success);
    assert_eq!(got.data.unwrap().name, "T");
}
