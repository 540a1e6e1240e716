//! HTTP routes for Bloggy

pub mod health;
pub mod v1;

pub use health::{health_check, HealthResponse};
pub use v1::{handle_create, handle_find, handle_modify, handle_remove, title_param, BoxError};
