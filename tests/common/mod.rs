// Shared test support: row builders and fault-injection store wrappers.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use pressvault::store::memory::{MemoryObjectStore, MemoryRelationalStore};
use pressvault::store::{ObjectStore, RelationalStore, Row, StoreError};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static TRACING: Once = Once::new();

/// Install a log subscriber once per test binary. Honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn row(id: u64, title: &str) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), json!(id));
    row.insert("title".to_string(), json!(title));
    row
}

pub fn rows(count: usize) -> Vec<Row> {
    (0..count as u64).map(|i| row(i, &format!("row {}", i))).collect()
}

/// Relational store that fails a configured number of insert calls per
/// table, then behaves normally. Selects and deletes pass through.
#[derive(Clone)]
pub struct FlakyRelationalStore {
    inner: MemoryRelationalStore,
    insert_failures: Arc<HashMap<String, AtomicUsize>>,
}

impl FlakyRelationalStore {
    pub fn new(inner: MemoryRelationalStore, failures: Vec<(&str, usize)>) -> Self {
        let map = failures
            .into_iter()
            .map(|(table, count)| (table.to_string(), AtomicUsize::new(count)))
            .collect();
        Self {
            inner,
            insert_failures: Arc::new(map),
        }
    }

    pub fn inner(&self) -> &MemoryRelationalStore {
        &self.inner
    }
}

#[async_trait]
impl RelationalStore for FlakyRelationalStore {
    async fn select(&self, table: &str, limit: usize) -> Result<Vec<Row>, StoreError> {
        self.inner.select(table, limit).await
    }

    async fn insert(&self, table: &str, rows: &[Row]) -> Result<usize, StoreError> {
        if let Some(remaining) = self.insert_failures.get(table) {
            let prev = remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .unwrap_or(0);
            if prev > 0 {
                return Err(StoreError::Backend(format!(
                    "injected insert failure for {}",
                    table
                )));
            }
        }
        self.inner.insert(table, rows).await
    }

    async fn delete_all(&self, table: &str) -> Result<(), StoreError> {
        self.inner.delete_all(table).await
    }
}

/// Object store whose puts always fail. Gets and deletes pass through.
#[derive(Clone)]
pub struct BrokenUploadStore {
    inner: MemoryObjectStore,
}

impl BrokenUploadStore {
    pub fn new(inner: MemoryObjectStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ObjectStore for BrokenUploadStore {
    async fn put(&self, _path: &str, _data: Bytes, _content_type: &str) -> Result<(), StoreError> {
        Err(StoreError::Backend("object store unavailable".to_string()))
    }

    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        self.inner.get(path).await
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.inner.delete(path).await
    }
}
