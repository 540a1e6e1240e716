//! Error types for Bloggy
//!
//! Application-level failures (listener, HTTP plumbing, request decoding).
//! Storage operations have their own taxonomy in [`crate::storage::StorageError`].

use hyper::StatusCode;

/// Main error type for Bloggy operations
#[derive(Debug, thiserror::Error)]
pub enum BloggyError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BloggyError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Http(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for BloggyError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for BloggyError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

/// Result type alias for Bloggy operations
pub type Result<T> = std::result::Result<T, BloggyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let err: BloggyError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().starts_with("Bad request: JSON error"));

        let err: BloggyError = std::io::Error::other("address in use").into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
