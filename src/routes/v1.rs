//! Version 1 post routes
//!
//! - `POST /v1/create` - insert the Post in the body
//! - `GET /v1/find/{title}` - return the Post as JSON
//! - `DELETE /v1/remove/{title}` - delete the Post
//! - `PATCH /v1/modify/{title}` - replace the Post with the body
//!
//! Domain errors are answered with 400 and the error text as a plain body.
//! Any other storage failure is logged and answered with an empty 500.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;
use tracing::{debug, error};

use crate::models::Post;
use crate::server::AppState;
use crate::storage::{with_deadline, StorageError};
use crate::types::{BloggyError, Result};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Error type a request body may fail with
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Route Handlers
// =============================================================================

/// Handle POST /v1/create
pub async fn handle_create<B>(req: Request<B>, state: Arc<AppState>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let post = match read_post(req).await {
        Ok(post) => post,
        Err(e) => return text_response(e.status_code(), &e.to_string()),
    };

    debug!(title = %post.title, "Creating post");

    match with_deadline(state.request_timeout(), state.store.insert(post)).await {
        Ok(()) => empty_response(StatusCode::OK),
        Err(e) => storage_error_response("insert into", e),
    }
}

/// Handle GET /v1/find/{title}
pub async fn handle_find(title: &str, state: Arc<AppState>) -> Response<Full<Bytes>> {
    match with_deadline(state.request_timeout(), state.store.find(title)).await {
        Ok(post) => json_response(StatusCode::OK, &post),
        Err(e) => storage_error_response("find in", e),
    }
}

/// Handle DELETE /v1/remove/{title}
pub async fn handle_remove(title: &str, state: Arc<AppState>) -> Response<Full<Bytes>> {
    match with_deadline(state.request_timeout(), state.store.remove(title)).await {
        Ok(()) => empty_response(StatusCode::OK),
        Err(e) => storage_error_response("delete from", e),
    }
}

/// Handle PATCH /v1/modify/{title}
pub async fn handle_modify<B>(
    title: &str,
    req: Request<B>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let post = match read_post(req).await {
        Ok(post) => post,
        Err(e) => return text_response(e.status_code(), &e.to_string()),
    };

    match with_deadline(state.request_timeout(), state.store.modify(title, post)).await {
        Ok(()) => empty_response(StatusCode::OK),
        Err(e) => storage_error_response("modify in", e),
    }
}

/// Extract and percent-decode the `{title}` segment after `route`.
///
/// Returns `None` unless exactly one non-empty segment follows.
pub fn title_param(path: &str, route: &str) -> Option<String> {
    let raw = path.strip_prefix(route)?.strip_prefix('/')?;

    if raw.is_empty() || raw.contains('/') {
        return None;
    }

    urlencoding::decode(raw).ok().map(|title| title.into_owned())
}

// =============================================================================
// Helpers
// =============================================================================

/// Read the request body as a Post
async fn read_post<B>(req: Request<B>) -> Result<Post>
where
    B: Body,
    B::Error: Into<BoxError>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                BloggyError::BadRequest("request body too large".into())
            } else {
                BloggyError::Http(format!("Failed to read body: {}", e))
            }
        })?;

    Ok(serde_json::from_slice(&body.to_bytes())?)
}

/// Map a storage error onto the response the client sees
fn storage_error_response(action: &str, err: StorageError) -> Response<Full<Bytes>> {
    if err.is_domain() {
        return text_response(StatusCode::BAD_REQUEST, &err.to_string());
    }

    error!("Unable to {} store: {}", action, err);
    empty_response(StatusCode::INTERNAL_SERVER_ERROR)
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

fn text_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(Full::new(Bytes::from(message.to_string())))
        .unwrap()
}

fn json_response(status: StatusCode, post: &Post) -> Response<Full<Bytes>> {
    match serde_json::to_vec(post) {
        Ok(body) => Response::builder()
            .status(status)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body)))
            .unwrap(),
        Err(e) => {
            error!("Unable to encode post '{}': {}", post.title, e);
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
