//! Bloggy - blog post CRUD service
//!
//! Posts are created, found, modified and removed by their unique title
//! through a small versioned HTTP API. Storage is pluggable:
//!
//! - **Memory**: process-local map, insertion ordered
//! - **Mongo**: MongoDB collection with a unique index on `title`
//!
//! Both backends implement [`storage::Storage`] and report failures through
//! the same [`storage::StorageError`] taxonomy, so the routes never branch on
//! which backend is active.

pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod server;
pub mod storage;
pub mod types;

pub use config::Args;
pub use models::Post;
pub use server::{run, AppState};
pub use storage::{Storage, StorageError, StorageResult};
pub use types::{BloggyError, Result};
