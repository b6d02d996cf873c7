//! HTTP API for contest records
//!
//! All routes live under `/api/v1` and speak JSON:
//!
//! ## Service
//! - `GET /health` - ledger reachability (503 when unreachable)
//! - `GET /stats` - record counts
//!
//! ## Records
//! - `POST /content`, `GET /content/{id}`, `GET /contents`
//! - `POST /contests`, `GET /contests/{id}`, `GET /contests`
//! - `GET /contests/search?keyword=...`
//! - `POST /contestants`, `GET /contestants/{id}`, `GET /contestants`
//! - `POST /sponsors`, `GET /sponsors/{id}`, `GET /sponsors`
//!
//! ## Registrations
//! - `POST /contests/{contest_id}/register` - body `{"contestant_id": "..."}`
//! - `GET /contests/{contest_id}/contestants`
//! - `GET /contests/{contest_id}/contestants/{contestant_id}` - `{success, registered}`
//!
//! `OPTIONS` on any path answers the CORS preflight.
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X POST -H "Content-Type: application/json" \
//!      -d '{"name":"Spring Cup","description":"Annual","start_date":"2025-07-05T00:00:00Z","end_date":"2025-08-05T00:00:00Z"}' \
//!      http://localhost:8081/api/v1/contests
//!
//! curl 'http://localhost:8081/api/v1/contests/search?keyword=spring'
//! ```

pub mod handlers;
pub mod response;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::store::RecordStore;
use response::HttpResponse;

/// Path prefix for every route.
pub const API_PREFIX: &str = "/api/v1";

/// HTTP server state
pub struct HttpServer {
    store: Arc<dyn RecordStore>,
    bind_addr: SocketAddr,
}

impl HttpServer {
    pub fn new(store: Arc<dyn RecordStore>, bind_addr: SocketAddr) -> Self {
        Self { store, bind_addr }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Run the HTTP server
    pub async fn run(self: Arc<Self>) -> Result<(), StoreError> {
        let listener = TcpListener::bind(self.bind_addr).await?;
        info!(addr = %self.bind_addr, "HTTP server listening");

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let server = self.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let server = server.clone();
                    async move { server.handle_request(req).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    warn!(addr = %remote_addr, error = %err, "Connection error");
                }
            });
        }
    }

    /// Route a request to its handler.
    pub async fn handle_request<B>(&self, req: Request<B>) -> Result<HttpResponse, hyper::Error>
    where
        B: Body,
        B::Error: fmt::Display,
    {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let query = req.uri().query().map(str::to_string);

        debug!(method = %method, path = %path, "Incoming request");

        if method == Method::OPTIONS {
            return Ok(response::preflight());
        }

        let Some(route) = path.strip_prefix(API_PREFIX) else {
            return Ok(response::not_found("Not Found"));
        };
        let segments: Vec<&str> = route.trim_matches('/').split('/').collect();
        let store = self.store.as_ref();

        let resp = match (method, segments.as_slice()) {
            (Method::GET, ["health"]) => handlers::health(store).await,
            (Method::GET, ["stats"]) => handlers::stats(store).await,

            // Content
            (Method::POST, ["content"]) => match read_body(req).await {
                Ok(body) => handlers::create_content(store, body).await,
                Err(resp) => resp,
            },
            (Method::GET, ["content", id]) => handlers::get_content(store, id).await,
            (Method::GET, ["contents"]) => handlers::list_contents(store).await,

            // Contests
            (Method::GET, ["contests"]) => handlers::list_contests(store).await,
            (Method::POST, ["contests"]) => match read_body(req).await {
                Ok(body) => handlers::create_contest(store, body).await,
                Err(resp) => resp,
            },
            (Method::GET, ["contests", "search"]) => {
                handlers::search_contests(store, query.as_deref()).await
            }
            (Method::GET, ["contests", id]) => handlers::get_contest(store, id).await,

            // Registrations
            (Method::POST, ["contests", contest_id, "register"]) => match read_body(req).await {
                Ok(body) => handlers::register_contestant(store, contest_id, body).await,
                Err(resp) => resp,
            },
            (Method::GET, ["contests", contest_id, "contestants"]) => {
                handlers::contestants_in_contest(store, contest_id).await
            }
            (Method::GET, ["contests", contest_id, "contestants", contestant_id]) => {
                handlers::is_registered(store, contest_id, contestant_id).await
            }

            // Contestants
            (Method::POST, ["contestants"]) => match read_body(req).await {
                Ok(body) => handlers::create_contestant(store, body).await,
                Err(resp) => resp,
            },
            (Method::GET, ["contestants", id]) => handlers::get_contestant(store, id).await,
            (Method::GET, ["contestants"]) => handlers::list_contestants(store).await,

            // Sponsors
            (Method::POST, ["sponsors"]) => match read_body(req).await {
                Ok(body) => handlers::create_sponsor(store, body).await,
                Err(resp) => resp,
            },
            (Method::GET, ["sponsors", id]) => handlers::get_sponsor(store, id).await,
            (Method::GET, ["sponsors"]) => handlers::list_sponsors(store).await,

            _ => response::not_found("Not Found"),
        };

        Ok(resp)
    }
}

async fn read_body<B>(req: Request<B>) -> Result<Bytes, HttpResponse>
where
    B: Body,
    B::Error: fmt::Display,
{
    match req.into_body().collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) => Err(response::error(
            StatusCode::BAD_REQUEST,
            "Invalid request body",
            &e.to_string(),
        )),
    }
}
