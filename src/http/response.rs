//! HTTP response building helpers
//!
//! Every response carries the permissive CORS headers browsers expect from
//! this API. Failures use the [`ErrorResponse`] envelope.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Response, StatusCode};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::StoreError;
use crate::models::ErrorResponse;

pub type HttpResponse = Response<Full<Bytes>>;

fn with_cors(builder: hyper::http::response::Builder) -> hyper::http::response::Builder {
    builder
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .header(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            "GET, POST, PUT, DELETE, OPTIONS",
        )
        .header(header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type, Authorization")
        .header(header::ACCESS_CONTROL_MAX_AGE, "3600")
}

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    with_cors(Response::builder())
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// 200 OK with JSON body
pub fn ok<T: Serialize>(body: &T) -> HttpResponse {
    json_response(StatusCode::OK, body)
}

/// 201 Created with JSON body
pub fn created<T: Serialize>(body: &T) -> HttpResponse {
    json_response(StatusCode::CREATED, body)
}

/// 200 OK with no body, for CORS preflight
pub fn preflight() -> HttpResponse {
    with_cors(Response::builder())
        .status(StatusCode::OK)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Error envelope with an explicit status
pub fn error(status: StatusCode, error: &str, details: &str) -> HttpResponse {
    json_response(status, &ErrorResponse::new(error, details))
}

pub fn bad_request(message: &str) -> HttpResponse {
    error(StatusCode::BAD_REQUEST, message, "")
}

pub fn not_found(message: &str) -> HttpResponse {
    error(StatusCode::NOT_FOUND, message, "")
}

/// Map a store failure to a response. `operation` is the message used
/// when the failure is not the caller's fault ("Failed to create contest").
pub fn store_error(operation: &str, err: StoreError) -> HttpResponse {
    match &err {
        StoreError::Validation(msg) => {
            warn!(error = %msg, "Request rejected");
            error(StatusCode::BAD_REQUEST, msg, "")
        }
        StoreError::NotFound { .. } => error(StatusCode::NOT_FOUND, &err.user_message(), ""),
        StoreError::AlreadyRegistered { .. } => {
            error(StatusCode::CONFLICT, &err.user_message(), "")
        }
        _ => {
            error!(operation = %operation, error = %err, "Store operation failed");
            error(StatusCode::INTERNAL_SERVER_ERROR, operation, &err.to_string())
        }
    }
}
