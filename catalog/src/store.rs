use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("collection {0} unavailable")]
    Unavailable(String),
}

/// Storage seam for the catalog collections. The service only needs
/// wholesale operations: the initializer clears and repopulates whole
/// collections, the API reads them back.
#[async_trait]
pub trait CatalogStore {
    /// Remove every record in the collection, returning the count removed.
    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError>;

    /// Bulk-insert records into the collection, returning the count inserted.
    async fn insert_many(&self, collection: &str, records: &[Value]) -> Result<u64, StoreError>;

    /// All records of the collection, in insertion order.
    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;
}

#[async_trait]
impl<T> CatalogStore for std::sync::Arc<T>
where
    T: CatalogStore + Send + Sync + ?Sized,
{
    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError> {
        (**self).delete_all(collection).await
    }

    async fn insert_many(&self, collection: &str, records: &[Value]) -> Result<u64, StoreError> {
        (**self).insert_many(collection, records).await
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        (**self).find_all(collection).await
    }
}

/// Postgres-backed store. Catalog records are schemaless documents, so
/// they live as JSONB rows keyed by collection name. One pool is opened
/// at startup and shared by the route handlers and the data initializer.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS catalog_records (
                id BIGSERIAL PRIMARY KEY,
                collection TEXT NOT NULL,
                data JSONB NOT NULL
            )",
        )
        .execute(&pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS catalog_records_collection_idx
             ON catalog_records (collection)",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM catalog_records WHERE collection = $1")
            .bind(collection)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_many(&self, collection: &str, records: &[Value]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            sqlx::query("INSERT INTO catalog_records (collection, data) VALUES ($1, $2)")
                .bind(collection)
                .bind(record)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(records.len() as u64)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let records = sqlx::query_scalar(
            "SELECT data FROM catalog_records WHERE collection = $1 ORDER BY id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}

/// In-memory store with per-collection failure injection, for tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
    failing_deletes: Mutex<HashSet<String>>,
    failing_inserts: Mutex<HashSet<String>>,
    failing_reads: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `delete_all` fail for the given collection.
    pub fn fail_deletes_on(&self, collection: &str) {
        self.failing_deletes
            .lock()
            .unwrap()
            .insert(collection.to_string());
    }

    /// Make `insert_many` fail for the given collection.
    pub fn fail_inserts_on(&self, collection: &str) {
        self.failing_inserts
            .lock()
            .unwrap()
            .insert(collection.to_string());
    }

    /// Make `find_all` fail for the given collection.
    pub fn fail_reads_on(&self, collection: &str) {
        self.failing_reads
            .lock()
            .unwrap()
            .insert(collection.to_string());
    }

    pub fn records(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn delete_all(&self, collection: &str) -> Result<u64, StoreError> {
        if self.failing_deletes.lock().unwrap().contains(collection) {
            return Err(StoreError::Unavailable(collection.to_string()));
        }
        let removed = self
            .collections
            .lock()
            .unwrap()
            .remove(collection)
            .map_or(0, |records| records.len());
        Ok(removed as u64)
    }

    async fn insert_many(&self, collection: &str, records: &[Value]) -> Result<u64, StoreError> {
        if self.failing_inserts.lock().unwrap().contains(collection) {
            return Err(StoreError::Unavailable(collection.to_string()));
        }
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .extend_from_slice(records);
        Ok(records.len() as u64)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        if self.failing_reads.lock().unwrap().contains(collection) {
            return Err(StoreError::Unavailable(collection.to_string()));
        }
        Ok(self.records(collection))
    }
}
