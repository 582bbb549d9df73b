use crate::store::{ObjectStore, RelationalStore, Row, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory relational store backed by a concurrent map of tables.
#[derive(Clone, Default)]
pub struct MemoryRelationalStore {
    tables: Arc<DashMap<String, Vec<Row>>>,
}

impl MemoryRelationalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table if it does not exist.
    pub fn create_table(&self, table: &str) {
        self.tables.entry(table.to_string()).or_default();
    }

    /// Replace the full contents of a table, creating it if needed.
    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        self.tables.insert(table.to_string(), rows);
    }

    /// Current contents of a table, if it exists.
    pub fn rows(&self, table: &str) -> Option<Vec<Row>> {
        self.tables.get(table).map(|entry| entry.value().clone())
    }

    /// Number of rows in a table, zero if absent.
    pub fn row_count(&self, table: &str) -> usize {
        self.tables.get(table).map(|entry| entry.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RelationalStore for MemoryRelationalStore {
    async fn select(&self, table: &str, limit: usize) -> Result<Vec<Row>, StoreError> {
        let rows = self
            .tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;
        Ok(rows.iter().take(limit).cloned().collect())
    }

    async fn insert(&self, table: &str, rows: &[Row]) -> Result<usize, StoreError> {
        let mut entry = self.tables.entry(table.to_string()).or_default();
        entry.extend_from_slice(rows);
        Ok(rows.len())
    }

    async fn delete_all(&self, table: &str) -> Result<(), StoreError> {
        if let Some(mut entry) = self.tables.get_mut(table) {
            entry.clear();
        }
        Ok(())
    }
}

/// In-memory object store keyed by path.
#[derive(Clone, Default)]
pub struct MemoryObjectStore {
    objects: Arc<DashMap<String, (Bytes, String)>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an object exists at `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.objects.contains_key(path)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, path: &str, data: Bytes, content_type: &str) -> Result<(), StoreError> {
        self.objects
            .insert(path.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        self.objects
            .get(path)
            .map(|entry| entry.value().0.clone())
            .ok_or_else(|| StoreError::ObjectNotFound(path.to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.objects.remove(path);
        Ok(())
    }
}
