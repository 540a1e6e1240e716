//! MongoDB post storage
//!
//! Title uniqueness is enforced by the `title_unique` index rather than by
//! application locking. Missing posts are detected from the server's
//! matched/deleted counts.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bson::{doc, Document};
use tracing::{info, warn};

use super::{Storage, StorageError, StorageResult};
use crate::config::MongoArgs;
use crate::db::{MongoClient, MongoCollection};
use crate::models::Post;

fn by_title(title: &str) -> Document {
    doc! { "title": title }
}

/// Field replacement for a modify. `_id` is never part of it.
fn replacement(post: &Post) -> Document {
    doc! {
        "$set": {
            "name": post.name.as_str(),
            "title": post.title.as_str(),
            "content": post.content.as_str(),
        }
    }
}

/// A write that touched no document means the title was not stored
fn require_match(count: u64) -> StorageResult<()> {
    if count == 0 {
        return Err(StorageError::DoesNotExist);
    }

    Ok(())
}

/// Post store backed by a MongoDB collection
pub struct MongoStore {
    client: MongoClient,
    posts: MongoCollection<Post>,
    disconnected: AtomicBool,
}

impl MongoStore {
    /// Connect to the configured server and bind the post collection
    pub async fn connect(args: &MongoArgs) -> StorageResult<Self> {
        let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db, args.mongodb_timeout_ms)
            .await?;
        Self::new(client, &args.mongodb_collection).await
    }

    /// Bind a collection on an existing client, ensuring the title index
    pub async fn new(client: MongoClient, collection: &str) -> StorageResult<Self> {
        let posts = client.collection::<Post>(collection).await?;

        info!(
            "MongoStore bound to collection '{}.{}'",
            client.db_name(),
            posts.name()
        );

        Ok(Self {
            client,
            posts,
            disconnected: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl Storage for MongoStore {
    async fn insert(&self, mut post: Post) -> StorageResult<()> {
        post.id = None;
        self.posts.insert_one(&post).await
    }

    async fn find(&self, title: &str) -> StorageResult<Post> {
        self.posts
            .find_one(by_title(title))
            .await?
            .ok_or(StorageError::DoesNotExist)
    }

    async fn remove(&self, title: &str) -> StorageResult<()> {
        let result = self.posts.delete_one(by_title(title)).await?;
        require_match(result.deleted_count)
    }

    async fn modify(&self, title: &str, post: Post) -> StorageResult<()> {
        let result = self
            .posts
            .update_one(by_title(title), replacement(&post))
            .await?;
        require_match(result.matched_count)
    }

    async fn all(&self) -> StorageResult<Vec<Post>> {
        self.posts.find_many(doc! {}).await
    }

    async fn disconnect(&self) -> StorageResult<()> {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            warn!("MongoStore already disconnected");
            return Ok(());
        }

        self.client.shutdown().await;
        info!("Disconnected from MongoDB");

        Ok(())
    }

    async fn clean(&self) -> StorageResult<()> {
        let deleted = self.posts.delete_many(doc! {}).await?;
        info!("Cleaned {} post(s) from '{}'", deleted, self.posts.name());

        Ok(())
    }
}
