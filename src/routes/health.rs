//! Health check endpoint
//!
//! `/health` and `/healthz` return 200 while the process is serving. The
//! body names the active storage backend so operators can tell an ephemeral
//! in-memory instance from a persistent one.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use crate::server::AppState;

/// Liveness response
#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: &'static str,
    pub backend: String,
    pub node_id: String,
    pub timestamp: String,
}

/// Handle GET /health
pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        backend: state.args.backend.to_string(),
        node_id: state.args.node_id.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    let body = serde_json::to_string(&response)
        .unwrap_or_else(|_| r#"{"healthy":true}"#.to_string());

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Cache-Control", "no-store")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}
