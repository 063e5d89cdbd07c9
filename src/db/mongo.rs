//! MongoDB client and collection wrapper

use bson::{doc, oid::ObjectId, DateTime, Document};
use futures_util::{TryStream, TryStreamExt};
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::AssuranceError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Filter clause excluding soft-deleted documents
fn not_deleted(mut filter: Document) -> Document {
    filter.insert("metadata.is_deleted", doc! { "$ne": true });
    filter
}

/// Collect every document from a cursor, failing on the first bad read
async fn drain_cursor<T, E, S>(cursor: S) -> Result<Vec<T>, AssuranceError>
where
    S: TryStream<Ok = T, Error = E>,
    E: std::fmt::Display,
{
    cursor.try_collect().await.map_err(|e| {
        error!("Error reading document: {}", e);
        AssuranceError::Database(format!("Cursor read failed: {}", e))
    })
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping the database
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, AssuranceError> {
        info!("Connecting to MongoDB at {}", uri);

        // Fail fast when the server is unreachable so dev mode can fall back
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri).await.map_err(|e| {
            AssuranceError::Database(format!("Failed to connect to MongoDB: {}", e))
        })?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| AssuranceError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection with its indexes applied
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, AssuranceError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Typed MongoDB collection with soft-delete aware queries
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, AssuranceError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), AssuranceError> {
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
            .map_err(|e| AssuranceError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId, AssuranceError> {
        let metadata = item.mut_metadata();
        metadata.is_deleted = false;
        metadata.created_at = Some(DateTime::now());
        metadata.updated_at = Some(DateTime::now());

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| AssuranceError::Database(format!("Insert failed: {}", e)))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| AssuranceError::Database("Failed to get inserted ID".into()))
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, AssuranceError> {
        self.inner
            .find_one(not_deleted(filter))
            .await
            .map_err(|e| AssuranceError::Database(format!("Find failed: {}", e)))
    }

    /// First document in `sort` order
    pub async fn find_first(
        &self,
        filter: Document,
        sort: Document,
    ) -> Result<Option<T>, AssuranceError> {
        self.inner
            .find_one(not_deleted(filter))
            .sort(sort)
            .await
            .map_err(|e| AssuranceError::Database(format!("Find failed: {}", e)))
    }

    pub async fn find_many(&self, filter: Document) -> Result<Vec<T>, AssuranceError> {
        self.find_sorted(filter, doc! { "_id": 1 }).await
    }

    /// Live documents in `sort` order. Any cursor error fails the read.
    pub async fn find_sorted(
        &self,
        filter: Document,
        sort: Document,
    ) -> Result<Vec<T>, AssuranceError> {
        let cursor = self
            .inner
            .find(not_deleted(filter))
            .sort(sort)
            .await
            .map_err(|e| AssuranceError::Database(format!("Find failed: {}", e)))?;

        drain_cursor(cursor).await
    }

    /// Update one live document, bumping `metadata.updated_at`
    pub async fn update_one(
        &self,
        filter: Document,
        mut set: Document,
    ) -> Result<UpdateResult, AssuranceError> {
        set.insert("metadata.updated_at", DateTime::now());
        let update: UpdateModifications = doc! { "$set": set }.into();

        self.inner
            .update_one(not_deleted(filter), update)
            .await
            .map_err(|e| AssuranceError::Database(format!("Update failed: {}", e)))
    }

    /// Soft delete a live document; false when nothing matched
    pub async fn soft_delete(&self, filter: Document, actor: &str) -> Result<bool, AssuranceError> {
        let result = self
            .update_one(
                filter,
                doc! {
                    "metadata.is_deleted": true,
                    "metadata.deleted_at": DateTime::now(),
                    "metadata.deleted_by": actor,
                },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}
