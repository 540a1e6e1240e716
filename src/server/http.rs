//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo, one task per accepted connection.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Args;
use crate::routes::{self, title_param, BoxError};
use crate::storage::Storage;
use crate::types::BloggyError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Post storage, constructed once at startup
    pub store: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(args: Args, store: Arc<dyn Storage>) -> Self {
        Self { args, store }
    }

    /// Deadline for each storage call
    pub fn request_timeout(&self) -> Duration {
        self.args.request_timeout()
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), BloggyError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Bloggy listening on {} as node {} ({} backend)",
        state.args.listen, state.args.node_id, state.args.backend
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, Infallible>(handle_request(state, req).await) }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route an HTTP request to its handler
pub async fn handle_request<B>(state: Arc<AppState>, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("{} {}", method, path);

    match (method, path.as_str()) {
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(state),

        (Method::POST, "/v1/create") => routes::handle_create(req, state).await,

        (Method::GET, p) if p.starts_with("/v1/find/") => match title_param(p, "/v1/find") {
            Some(title) => routes::handle_find(&title, state).await,
            None => not_found_response(p),
        },

        (Method::DELETE, p) if p.starts_with("/v1/remove/") => {
            match title_param(p, "/v1/remove") {
                Some(title) => routes::handle_remove(&title, state).await,
                None => not_found_response(p),
            }
        }

        (Method::PATCH, p) if p.starts_with("/v1/modify/") => {
            match title_param(p, "/v1/modify") {
                Some(title) => routes::handle_modify(&title, req, state).await,
                None => not_found_response(p),
            }
        }

        (_, p) => not_found_response(p),
    }
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
