//! Database layer for Bloggy
//!
//! Provides MongoDB access for the document-store backend.

pub mod mongo;

pub use mongo::{IntoIndexes, MongoClient, MongoCollection};
