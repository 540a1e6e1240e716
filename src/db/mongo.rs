//! MongoDB client and collection wrapper
//!
//! Driver errors are translated into [`StorageError`] here: duplicate-key
//! violations become `AlreadyExists`, everything else becomes `Failure`.

use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::{
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
    results::{DeleteResult, UpdateResult},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::storage::{StorageError, StorageResult};

/// Server error code for a unique index violation
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Whether a driver error is a unique index violation
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn failure(context: &str, err: MongoError) -> StorageError {
    StorageError::Failure(format!("{}: {}", context, err))
}

fn write_failure(context: &str, err: MongoError) -> StorageError {
    if is_duplicate_key(&err) {
        StorageError::AlreadyExists
    } else {
        failure(context, err)
    }
}

/// Append fail-fast timeouts to a connection URI
pub fn with_timeouts(uri: &str, timeout_ms: u64) -> String {
    let hosts = uri.split_once("://").map(|(_, rest)| rest).unwrap_or(uri);
    let separator = if uri.contains('?') {
        "&"
    } else if hosts.contains('/') {
        "?"
    } else {
        "/?"
    };
    format!(
        "{}{}serverSelectionTimeoutMS={}&connectTimeoutMS={}",
        uri, separator, timeout_ms, timeout_ms
    )
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str, timeout_ms: u64) -> StorageResult<Self> {
        info!("Connecting to MongoDB database '{}'", db_name);

        let client = Client::with_uri_str(with_timeouts(uri, timeout_ms))
            .await
            .map_err(|e| failure("Failed to connect to MongoDB", e))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| failure("MongoDB ping failed", e))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection with its schema indexes applied
    pub async fn collection<T>(&self, name: &str) -> StorageResult<MongoCollection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    /// Close every pooled connection
    pub async fn shutdown(&self) {
        self.client.clone().shutdown().await;
    }

    /// Get the database name
    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes,
{
    /// Create a new collection and apply indexes
    pub async fn new(client: &Client, db_name: &str, collection_name: &str) -> StorageResult<Self> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    /// Apply schema-defined indexes
    async fn apply_indexes(&self) -> StorageResult<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| failure("Failed to create indexes", e))?;

        Ok(())
    }
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    /// Insert a document
    pub async fn insert_one(&self, item: &T) -> StorageResult<()> {
        self.inner
            .insert_one(item)
            .await
            .map_err(|e| write_failure("Insert failed", e))?;

        Ok(())
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> StorageResult<Option<T>> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| failure("Find failed", e))
    }

    /// Find every document matching the filter
    pub async fn find_many(&self, filter: Document) -> StorageResult<Vec<T>> {
        let cursor = self
            .inner
            .find(filter)
            .await
            .map_err(|e| failure("Find failed", e))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| failure("Reading documents failed", e))
    }

    /// Update one document
    pub async fn update_one(&self, filter: Document, update: Document) -> StorageResult<UpdateResult> {
        self.inner
            .update_one(filter, update)
            .await
            .map_err(|e| write_failure("Update failed", e))
    }

    /// Delete one document
    pub async fn delete_one(&self, filter: Document) -> StorageResult<DeleteResult> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| failure("Delete failed", e))
    }

    /// Delete every document matching the filter, returning the count
    pub async fn delete_many(&self, filter: Document) -> StorageResult<u64> {
        self.inner
            .delete_many(filter)
            .await
            .map(|result| result.deleted_count)
            .map_err(|e| failure("Delete failed", e))
    }

    /// Name of the underlying collection
    pub fn name(&self) -> &str {
        self.inner.name()
    }
}
