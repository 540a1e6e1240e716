//! HTTP server for Bloggy

pub mod http;

pub use http::{handle_request, run, AppState};
