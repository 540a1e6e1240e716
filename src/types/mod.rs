//! Shared types for Bloggy

pub mod error;

pub use error::{BloggyError, Result};
