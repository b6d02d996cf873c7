//! Integration tests for the HTTP API
//!
//! Requests are routed straight through `HttpServer::handle_request`
//! without opening a socket.

use bytes::Bytes;
use contest_ledger::abi::{Address, MethodInterface, CONTENT_STORAGE_INTERFACE};
use contest_ledger::ledger::Identity;
use contest_ledger::{ContractGateway, HttpServer, LedgerStore, MemoryStore, SimulatedLedger};
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;

fn memory_server() -> HttpServer {
    HttpServer::new(Arc::new(MemoryStore::new()), ([127, 0, 0, 1], 0).into())
}

fn simulated_server(ledger: Arc<SimulatedLedger>) -> HttpServer {
    let interface = MethodInterface::from_json_str(CONTENT_STORAGE_INTERFACE).unwrap();
    let gateway = ContractGateway::new(
        ledger.clone(),
        Arc::new(interface),
        Address([0x77; 20]),
        Arc::new(Identity::random()),
        ledger.chain_id(),
    );
    HttpServer::new(Arc::new(LedgerStore::new(gateway)), ([127, 0, 0, 1], 0).into())
}

/// Send a request and return status plus decoded JSON body.
async fn send(server: &HttpServer, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(payload)))
        .unwrap();
    let resp = server.handle_request(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn contest_body(name: &str) -> Value {
    json!({
        "name": name,
        "description": "Annual photo contest",
        "start_date": "2025-07-05T00:00:00Z",
        "end_date": "2025-08-05T00:00:00Z",
        "image_url": "https://example.org/cup.png"
    })
}

#[tokio::test]
async fn test_health_reports_connected() {
    let server = memory_server();
    let (status, body) = send(&server, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["blockchain"], "connected");
}

#[tokio::test]
async fn test_health_reports_offline_ledger() {
    let ledger = Arc::new(SimulatedLedger::default());
    let server = simulated_server(ledger.clone());
    ledger.set_offline(true).await;

    let (status, body) = send(&server, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["blockchain"], "disconnected");
    assert!(body["error"].as_str().unwrap().contains("Blockchain connection failed"));
}

#[tokio::test]
async fn test_contest_lifecycle() {
    let server = memory_server();

    let (status, created) = send(&server, Method::POST, "/api/v1/contests", Some(contest_body("Spring Cup"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["success"], true);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 32);
    assert!(created["tx_hash"].as_str().unwrap().starts_with("0x"));

    let (status, got) = send(&server, Method::GET, &format!("/api/v1/contests/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(got["data"]["name"], "Spring Cup");
    assert_eq!(got["data"]["start_date"], "2025-07-05T00:00:00Z");

    let (status, listed) = send(&server, Method::GET, "/api/v1/contests", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total"], 1);

    let (status, _) = send(&server, Method::GET, "/api/v1/contests/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contest_validation_messages() {
    let server = memory_server();

    let mut body = contest_body("");
    let (status, resp) = send(&server, Method::POST, "/api/v1/contests", Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], "Contest name is required");

    body["name"] = json!("Cup");
    body["start_date"] = json!("invalid-date");
    let (status, resp) = send(&server, Method::POST, "/api/v1/contests", Some(body.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(resp["error"].as_str().unwrap().contains("Invalid start date format"));

    body["start_date"] = json!("2025-09-01T00:00:00Z");
    let (status, resp) = send(&server, Method::POST, "/api/v1/contests", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], "End date must be after start date");
}

#[tokio::test]
async fn test_search_by_keyword() {
    let server = memory_server();
    send(&server, Method::POST, "/api/v1/contests", Some(contest_body("Cuộc thi Việt Nam"))).await;
    send(&server, Method::POST, "/api/v1/contests", Some(contest_body("Spring Cup"))).await;

    let (status, resp) = send(&server, Method::GET, "/api/v1/contests/search?keyword=viet", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["total"], 1);
    assert_eq!(resp["data"][0]["name"], "Cuộc thi Việt Nam");

    let (status, resp) = send(&server, Method::GET, "/api/v1/contests/search?keyword=spring%20cup", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["total"], 1);

    let (status, _) = send(&server, Method::GET, "/api/v1/contests/search?keyword=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_registration_flow() {
    let server = memory_server();

    let (_, contest) = send(&server, Method::POST, "/api/v1/contests", Some(contest_body("Cup"))).await;
    let contest_id = contest["id"].as_str().unwrap().to_string();
    let (status, contestant) = send(
        &server,
        Method::POST,
        "/api/v1/contestants",
        Some(json!({"name": "Ada", "details": "Painter"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let contestant_id = contestant["id"].as_str().unwrap().to_string();

    let register = format!("/api/v1/contests/{}/register", contest_id);
    let (status, _) = send(&server, Method::POST, &register, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Contest id in the body is overridden by the path
    let body = json!({"contest_id": "elsewhere", "contestant_id": contestant_id});
    let (status, resp) = send(&server, Method::POST, &register, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["success"], true);

    let (status, resp) = send(&server, Method::POST, &register, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["error"], "Contestant already registered for this contest");

    let (status, resp) = send(
        &server,
        Method::GET,
        &format!("/api/v1/contests/{}/contestants", contest_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["total"], 1);
    assert_eq!(resp["contestants"][0]["name"], "Ada");

    let (status, resp) = send(
        &server,
        Method::GET,
        &format!("/api/v1/contests/{}/contestants/{}", contest_id, contestant_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["registered"], true);

    let (status, _) = send(&server, Method::GET, "/api/v1/contests/nope/contestants", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &server,
        Method::POST,
        "/api/v1/contests/nope/register",
        Some(json!({"contestant_id": contestant_id})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_and_sponsor_routes() {
    let server = memory_server();

    let (status, resp) = send(&server, Method::POST, "/api/v1/content", Some(json!({"content": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], "Title is required");

    let (status, resp) = send(
        &server,
        Method::POST,
        "/api/v1/content",
        Some(json!({"title": "Hello", "content": "World"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let content_id = resp["id"].as_str().unwrap().to_string();

    let (status, resp) = send(&server, Method::GET, &format!("/api/v1/content/{}", content_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["data"]["creator"], "anonymous");

    let (status, resp) = send(
        &server,
        Method::POST,
        "/api/v1/sponsors",
        Some(json!({"name": "Acme", "sponsorship_amount": 500})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["error"], "Contact info is required");

    let (status, _) = send(
        &server,
        Method::POST,
        "/api/v1/sponsors",
        Some(json!({"name": "Acme", "contact_info": "a@acme.test", "sponsorship_amount": 500})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = send(&server, Method::GET, "/api/v1/sponsors", None).await;
    assert_eq!(listed["data"][0]["sponsorship_amount"], 500);

    let (_, stats) = send(&server, Method::GET, "/api/v1/stats", None).await;
    assert_eq!(stats["data"]["total_contents"], 1);
    assert_eq!(stats["data"]["total_sponsors"], 1);
}

#[tokio::test]
async fn test_ledger_backed_get_of_cache_only_kind() {
    let server = simulated_server(Arc::new(SimulatedLedger::default()));

    let (status, resp) = send(
        &server,
        Method::POST,
        "/api/v1/contestants",
        Some(json!({"name": "Ada", "details": "Painter"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = resp["id"].as_str().unwrap().to_string();

    let (status, resp) = send(&server, Method::GET, &format!("/api/v1/contestants/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(resp["lookup"], "not_wired_on_chain");
    assert_eq!(resp["message"], "Contestant not found on blockchain");

    let (_, listed) = send(&server, Method::GET, "/api/v1/contestants", None).await;
    assert_eq!(listed["total"], 1);
}

#[tokio::test]
async fn test_ledger_submission_failure_is_500() {
    use contest_ledger::ledger::simulated::Fault;
    use contest_ledger::LedgerError;

    let ledger = Arc::new(SimulatedLedger::default());
    ledger
        .inject_fault(
            "createContestJson",
            None,
            Fault::Fail(LedgerError::Reverted("out of gas".into())),
        )
        .await;
    let server = simulated_server(ledger);

    let (status, resp) = send(&server, Method::POST, "/api/v1/contests", Some(contest_body("Cup"))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp["success"], false);
    assert_eq!(resp["error"], "Failed to create contest");
    assert!(resp["message"].as_str().unwrap().contains("out of gas"));
}
