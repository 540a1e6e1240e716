//! Post storage
//!
//! The [`Storage`] trait is the capability set every backend provides.
//! Two backends exist:
//!
//! - [`MemoryStore`] - process-local map, insertion ordered
//! - [`MongoStore`] - MongoDB collection with a unique index on `title`
//!
//! Backend-specific failures (duplicate-key codes, matched/deleted counts,
//! driver errors) are translated into [`StorageError`] so callers never
//! branch on which backend they hold.

pub mod memory;
pub mod mongo;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Backend, MongoArgs};
use crate::models::Post;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Errors from storage operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A post with the same title is already stored
    #[error("storage: post already exists")]
    AlreadyExists,

    /// No post has the requested title
    #[error("storage: post does not exists")]
    DoesNotExist,

    /// Any other backend failure (network, decode, driver, deadline)
    #[error("storage: {0}")]
    Failure(String),
}

impl StorageError {
    /// Whether this is one of the two domain errors reported back to clients
    pub fn is_domain(&self) -> bool {
        matches!(self, Self::AlreadyExists | Self::DoesNotExist)
    }
}

/// Result alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Capability set shared by all post backends
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store a new post. The store assigns its identifier.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if the title is taken,
    /// leaving the store unchanged.
    async fn insert(&self, post: Post) -> StorageResult<()>;

    /// Look up a post by title
    async fn find(&self, title: &str) -> StorageResult<Post>;

    /// Delete the post with this title
    async fn remove(&self, title: &str) -> StorageResult<()>;

    /// Replace every field of the post with this title except its identifier
    async fn modify(&self, title: &str, post: Post) -> StorageResult<()>;

    /// Every stored post, in backend order
    async fn all(&self) -> StorageResult<Vec<Post>>;

    /// Release backend resources
    async fn disconnect(&self) -> StorageResult<()>;

    /// Remove every stored post (test isolation)
    async fn clean(&self) -> StorageResult<()>;
}

/// Run a storage call under a deadline.
///
/// An expired deadline becomes [`StorageError::Failure`].
pub async fn with_deadline<T, F>(deadline: Duration, operation: F) -> StorageResult<T>
where
    F: Future<Output = StorageResult<T>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Failure(format!(
            "operation exceeded deadline of {}ms",
            deadline.as_millis()
        ))),
    }
}

/// Construct the configured backend
pub async fn open(backend: Backend, mongo: &MongoArgs) -> StorageResult<Arc<dyn Storage>> {
    match backend {
        Backend::Memory => {
            info!("Using in-memory post storage");
            Ok(Arc::new(MemoryStore::new()))
        }
        Backend::Mongo => {
            let store = MongoStore::connect(mongo).await?;
            Ok(Arc::new(store))
        }
    }
}
