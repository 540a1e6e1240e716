//! In-memory post storage
//!
//! Posts keyed by title, with insertion order tracked separately so
//! `all()` lists them in the order they were created.

use std::collections::HashMap;

use async_trait::async_trait;
use bson::oid::ObjectId;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Storage, StorageError, StorageResult};
use crate::models::Post;

#[derive(Debug, Default)]
struct Posts {
    by_title: HashMap<String, Post>,
    /// Titles in insertion order
    order: Vec<String>,
}

/// Process-local post store
#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: RwLock<Posts>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored posts
    pub async fn len(&self) -> usize {
        self.posts.read().await.by_title.len()
    }

    /// Whether the store holds no posts
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn insert(&self, mut post: Post) -> StorageResult<()> {
        let mut posts = self.posts.write().await;

        if posts.by_title.contains_key(&post.title) {
            return Err(StorageError::AlreadyExists);
        }

        post.id = Some(ObjectId::new());
        debug!(title = %post.title, "Inserting post");

        posts.order.push(post.title.clone());
        posts.by_title.insert(post.title.clone(), post);

        Ok(())
    }

    async fn find(&self, title: &str) -> StorageResult<Post> {
        self.posts
            .read()
            .await
            .by_title
            .get(title)
            .cloned()
            .ok_or(StorageError::DoesNotExist)
    }

    async fn remove(&self, title: &str) -> StorageResult<()> {
        let mut posts = self.posts.write().await;

        if posts.by_title.remove(title).is_none() {
            return Err(StorageError::DoesNotExist);
        }
        posts.order.retain(|t| t != title);

        Ok(())
    }

    async fn modify(&self, title: &str, mut post: Post) -> StorageResult<()> {
        let mut posts = self.posts.write().await;

        let id = match posts.by_title.get(title) {
            Some(existing) => existing.id,
            None => return Err(StorageError::DoesNotExist),
        };

        let renamed = post.title != title;
        if renamed && posts.by_title.contains_key(&post.title) {
            return Err(StorageError::AlreadyExists);
        }

        post.id = id;

        if renamed {
            posts.by_title.remove(title);
            if let Some(slot) = posts.order.iter_mut().find(|t| t.as_str() == title) {
                *slot = post.title.clone();
            }
        }
        posts.by_title.insert(post.title.clone(), post);

        Ok(())
    }

    async fn all(&self) -> StorageResult<Vec<Post>> {
        let posts = self.posts.read().await;

        Ok(posts
            .order
            .iter()
            .filter_map(|title| posts.by_title.get(title).cloned())
            .collect())
    }

    async fn disconnect(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn clean(&self) -> StorageResult<()> {
        let mut posts = self.posts.write().await;
        posts.by_title.clear();
        posts.order.clear();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello() -> Post {
        Post::new("Vishnu", "Hello", "Hello world")
    }

    fn world() -> Post {
        Post::new("Shankar", "World", "This is rust!!")
    }

    #[tokio::test]
    async fn test_insert_assigns_id() {
        let store = MemoryStore::new();
        let mut submitted = hello();
        submitted.id = Some(ObjectId::new());

        store.insert(submitted.clone()).await.unwrap();

        let stored = store.find("Hello").await.unwrap();
        assert!(stored.is_equal(&submitted));
        assert!(stored.id.is_some());
        assert_ne!(stored.id, submitted.id);
    }

    #[tokio::test]
    async fn test_insert_duplicate_leaves_store_unchanged() {
        let store = MemoryStore::new();
        store.insert(hello()).await.unwrap();
        let first = store.find("Hello").await.unwrap();

        let mut duplicate = hello();
        duplicate.content = "Overwritten?".to_string();
        assert_eq!(
            store.insert(duplicate).await,
            Err(StorageError::AlreadyExists)
        );

        assert_eq!(store.len().await, 1);
        assert_eq!(store.find("Hello").await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_all_keeps_insertion_order() {
        let store = MemoryStore::new();
        let third = Post::new("Bob", "Rust", "Rust is awesome!!");
        for post in [hello(), world(), third.clone()] {
            store.insert(post).await.unwrap();
        }

        store.remove("World").await.unwrap();
        store.insert(world()).await.unwrap();

        let titles: Vec<_> = store
            .all()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Hello", "Rust", "World"]);
    }

    #[tokio::test]
    async fn test_missing_title_operations() {
        let store = MemoryStore::new();
        store.insert(hello()).await.unwrap();

        assert_eq!(store.find("Nope").await, Err(StorageError::DoesNotExist));
        assert_eq!(store.remove("Nope").await, Err(StorageError::DoesNotExist));
        assert_eq!(
            store.modify("Nope", world()).await,
            Err(StorageError::DoesNotExist)
        );

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_equal(&hello()));
    }

    #[tokio::test]
    async fn test_modify_preserves_id() {
        let store = MemoryStore::new();
        store.insert(hello()).await.unwrap();
        let original = store.find("Hello").await.unwrap();

        let mut replacement = Post::new("X", "Hello", "Y");
        replacement.id = Some(ObjectId::new());
        store.modify("Hello", replacement.clone()).await.unwrap();

        let stored = store.find("Hello").await.unwrap();
        assert!(stored.is_equal(&replacement));
        assert_eq!(stored.id, original.id);
    }

    #[tokio::test]
    async fn test_modify_renames_in_place() {
        let store = MemoryStore::new();
        store.insert(hello()).await.unwrap();
        store.insert(world()).await.unwrap();

        store
            .modify("Hello", Post::new("Vishnu", "Greetings", "Hello again"))
            .await
            .unwrap();

        assert_eq!(store.find("Hello").await, Err(StorageError::DoesNotExist));
        let all = store.all().await.unwrap();
        assert_eq!(all[0].title, "Greetings");
        assert_eq!(all[1].title, "World");
    }

    #[tokio::test]
    async fn test_modify_rejects_rename_onto_existing_title() {
        let store = MemoryStore::new();
        store.insert(hello()).await.unwrap();
        store.insert(world()).await.unwrap();

        let result = store
            .modify("Hello", Post::new("Vishnu", "World", "clobber"))
            .await;
        assert_eq!(result, Err(StorageError::AlreadyExists));

        assert!(store.find("Hello").await.unwrap().is_equal(&hello()));
        assert!(store.find("World").await.unwrap().is_equal(&world()));
    }

    #[tokio::test]
    async fn test_clean_and_disconnect() {
        let store = MemoryStore::new();
        store.insert(hello()).await.unwrap();
        store.insert(world()).await.unwrap();

        store.clean().await.unwrap();
        assert!(store.is_empty().await);
        assert!(store.all().await.unwrap().is_empty());

        store.disconnect().await.unwrap();
        store.disconnect().await.unwrap();
    }
}
