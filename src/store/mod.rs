//! Collaborator contracts the core requires: a relational store for table
//! contents and an object store for envelope blobs.
//!
//! Production deployments adapt the platform's database and blob storage
//! behind these traits; [`memory`] provides DashMap-backed implementations
//! used in embedded contexts and tests.

pub mod memory;

pub use memory::{MemoryObjectStore, MemoryRelationalStore};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// A single table row: column name to JSON value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Errors surfaced by the relational and object stores
#[derive(Error, Debug)]
pub enum StoreError {
    /// The named table does not exist
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// No object at the given path
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Backend failure (connection, timeout, I/O)
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Row or blob (de)serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Table-oriented access to the live content tables.
#[async_trait]
pub trait RelationalStore: Send + Sync {
    /// Read up to `limit` rows of all columns from `table`.
    async fn select(&self, table: &str, limit: usize) -> Result<Vec<Row>, StoreError>;

    /// Insert rows into `table`, returning the number inserted.
    async fn insert(&self, table: &str, rows: &[Row]) -> Result<usize, StoreError>;

    /// Delete every row in `table`. Truncate-equivalent.
    async fn delete_all(&self, table: &str) -> Result<(), StoreError>;
}

/// Blob storage for backup envelopes.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `path`, overwriting any existing object.
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Fetch the object at `path`.
    async fn get(&self, path: &str) -> Result<Bytes, StoreError>;

    /// Delete the object at `path`. Deleting a missing object is not an
    /// error; callers rely on this for idempotent cleanup.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;
}
