//! Route handlers
//!
//! Each handler checks required fields, calls the store and shapes the
//! response. Handlers never fail: every outcome is an HTTP response.

use bytes::Bytes;
use hyper::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::response::{self, HttpResponse};
use crate::models::{
    CreateContentRequest, CreateContestRequest, CreateContestantRequest, CreateSponsorRequest,
    GetResponse, RegisterContestantRequest,
};
use crate::store::RecordStore;

/// Decode a JSON request body, or produce the 400 to send back.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, HttpResponse> {
    serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, "Undecodable request body");
        response::error(StatusCode::BAD_REQUEST, "Invalid request body", &e.to_string())
    })
}

fn require(value: &str, message: &str) -> Result<(), HttpResponse> {
    if value.trim().is_empty() {
        Err(response::bad_request(message))
    } else {
        Ok(())
    }
}

/// 200 when found, 404 with the same envelope otherwise.
fn lookup_response<T: Serialize>(resp: GetResponse<T>) -> HttpResponse {
    let status = if resp.success {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    response::json_response(status, &resp)
}

macro_rules! try_response {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(resp) => return resp,
        }
    };
}

// ============================================================================
// Service
// ============================================================================

/// GET /health
pub async fn health(store: &dyn RecordStore) -> HttpResponse {
    match store.health_check().await {
        Ok(()) => response::ok(&serde_json::json!({
            "status": "healthy",
            "blockchain": "connected",
            "message": "Service is running properly",
        })),
        Err(e) => {
            warn!(error = %e, "Health check failed");
            response::json_response(
                StatusCode::SERVICE_UNAVAILABLE,
                &serde_json::json!({
                    "status": "unhealthy",
                    "blockchain": "disconnected",
                    "error": e.to_string(),
                }),
            )
        }
    }
}

/// GET /stats
pub async fn stats(store: &dyn RecordStore) -> HttpResponse {
    match store.stats().await {
        Ok(resp) => response::ok(&resp),
        Err(e) => response::store_error("Failed to get statistics", e),
    }
}

// ============================================================================
// Content
// ============================================================================

/// POST /content
pub async fn create_content(store: &dyn RecordStore, body: Bytes) -> HttpResponse {
    let req: CreateContentRequest = try_response!(parse_body(&body));
    try_response!(require(&req.title, "Title is required"));
    try_response!(require(&req.content, "Content is required"));

    info!(title = %req.title, "Creating content");
    match store.create_content(req).await {
        Ok(resp) => response::created(&resp),
        Err(e) => response::store_error("Failed to create content", e),
    }
}

/// GET /content/{id}
pub async fn get_content(store: &dyn RecordStore, id: &str) -> HttpResponse {
    match store.get_content(id).await {
        Ok(resp) => lookup_response(resp),
        Err(e) => response::store_error("Failed to get content", e),
    }
}

/// GET /contents
pub async fn list_contents(store: &dyn RecordStore) -> HttpResponse {
    match store.list_contents().await {
        Ok(resp) => response::ok(&resp),
        Err(e) => response::store_error("Failed to list contents", e),
    }
}

// ============================================================================
// Contests
// ============================================================================

/// POST /contests
pub async fn create_contest(store: &dyn RecordStore, body: Bytes) -> HttpResponse {
    let req: CreateContestRequest = try_response!(parse_body(&body));
    try_response!(require(&req.name, "Contest name is required"));
    try_response!(require(&req.description, "Contest description is required"));
    if req.start_date.is_empty() || req.end_date.is_empty() {
        return response::bad_request("Start date and end date are required");
    }

    info!(name = %req.name, "Creating contest");
    match store.create_contest(req).await {
        Ok(resp) => response::created(&resp),
        Err(e) => response::store_error("Failed to create contest", e),
    }
}

/// GET /contests/{id}
pub async fn get_contest(store: &dyn RecordStore, id: &str) -> HttpResponse {
    match store.get_contest(id).await {
        Ok(resp) => lookup_response(resp),
        Err(e) => response::store_error("Failed to get contest", e),
    }
}

/// GET /contests
pub async fn list_contests(store: &dyn RecordStore) -> HttpResponse {
    match store.list_contests().await {
        Ok(resp) => response::ok(&resp),
        Err(e) => response::store_error("Failed to list contests", e),
    }
}

/// GET /contests/search?keyword=
pub async fn search_contests(store: &dyn RecordStore, query: Option<&str>) -> HttpResponse {
    let keyword = query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(k, _)| k == "keyword")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_default();
    if keyword.is_empty() {
        return response::bad_request("Missing keyword");
    }

    match store.search_contests(&keyword).await {
        Ok(results) => response::ok(&serde_json::json!({
            "success": true,
            "total": results.len(),
            "data": results,
        })),
        Err(e) => response::store_error("Search failed", e),
    }
}

// ============================================================================
// Registrations
// ============================================================================

/// POST /contests/{contest_id}/register
///
/// The contest id comes from the path; any `contest_id` in the body is
/// ignored.
pub async fn register_contestant(
    store: &dyn RecordStore,
    contest_id: &str,
    body: Bytes,
) -> HttpResponse {
    let mut req: RegisterContestantRequest = try_response!(parse_body(&body));
    req.contest_id = contest_id.to_string();
    try_response!(require(&req.contestant_id, "Contestant ID is required"));

    info!(contest_id = %req.contest_id, contestant_id = %req.contestant_id, "Registering contestant");
    match store.register_contestant(req).await {
        Ok(resp) => response::created(&resp),
        Err(e) => response::store_error("Failed to register contestant", e),
    }
}

/// GET /contests/{contest_id}/contestants
pub async fn contestants_in_contest(store: &dyn RecordStore, contest_id: &str) -> HttpResponse {
    match store.contestants_in_contest(contest_id).await {
        Ok(resp) if resp.success => response::ok(&resp),
        Ok(resp) => response::json_response(StatusCode::NOT_FOUND, &resp),
        Err(e) => response::store_error("Failed to get contestants", e),
    }
}

/// GET /contests/{contest_id}/contestants/{contestant_id}
pub async fn is_registered(
    store: &dyn RecordStore,
    contest_id: &str,
    contestant_id: &str,
) -> HttpResponse {
    match store.is_contestant_registered(contest_id, contestant_id).await {
        Ok(registered) => response::ok(&serde_json::json!({
            "success": true,
            "registered": registered,
        })),
        Err(e) => response::store_error("Failed to check registration", e),
    }
}

// ============================================================================
// Contestants
// ============================================================================

/// POST /contestants
pub async fn create_contestant(store: &dyn RecordStore, body: Bytes) -> HttpResponse {
    let req: CreateContestantRequest = try_response!(parse_body(&body));
    try_response!(require(&req.name, "Contestant name is required"));
    try_response!(require(&req.details, "Contestant details are required"));

    info!(name = %req.name, "Creating contestant");
    match store.create_contestant(req).await {
        Ok(resp) => response::created(&resp),
        Err(e) => response::store_error("Failed to create contestant", e),
    }
}

/// GET /contestants/{id}
pub async fn get_contestant(store: &dyn RecordStore, id: &str) -> HttpResponse {
    match store.get_contestant(id).await {
        Ok(resp) => lookup_response(resp),
        Err(e) => response::store_error("Failed to get contestant", e),
    }
}

/// GET /contestants
pub async fn list_contestants(store: &dyn RecordStore) -> HttpResponse {
    match store.list_contestants().await {
        Ok(resp) => response::ok(&resp),
        Err(e) => response::store_error("Failed to list contestants", e),
    }
}

// ============================================================================
// Sponsors
// ============================================================================

/// POST /sponsors
pub async fn create_sponsor(store: &dyn RecordStore, body: Bytes) -> HttpResponse {
    let req: CreateSponsorRequest = try_response!(parse_body(&body));
    try_response!(require(&req.name, "Sponsor name is required"));
    try_response!(require(&req.contact_info, "Contact info is required"));

    info!(name = %req.name, "Creating sponsor");
    match store.create_sponsor(req).await {
        Ok(resp) => response::created(&resp),
        Err(e) => response::store_error("Failed to create sponsor", e),
    }
}

/// GET /sponsors/{id}
pub async fn get_sponsor(store: &dyn RecordStore, id: &str) -> HttpResponse {
    match store.get_sponsor(id).await {
        Ok(resp) => lookup_response(resp),
        Err(e) => response::store_error("Failed to get sponsor", e),
    }
}

/// GET /sponsors
pub async fn list_sponsors(store: &dyn RecordStore) -> HttpResponse {
    match store.list_sponsors().await {
        Ok(resp) => response::ok(&resp),
        Err(e) => response::store_error("Failed to list sponsors", e),
    }
}
