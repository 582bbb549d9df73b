// Concurrency guarantees: at most one processor advances a record out of
// pending, regardless of how many race for the claim.

mod common;

use common::{init_tracing, rows};
use pressvault::catalog::{
    BackupRecord, CatalogStore, CreateBackupRequest, MemoryCatalogStore,
};
use pressvault::config::VaultConfig;
use pressvault::export::BackupExporter;
use pressvault::store::memory::{MemoryObjectStore, MemoryRelationalStore};
use pressvault::BackupStatus;
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn test_begin_backup_claims_for_exactly_one_of_many() {
    init_tracing();
    let catalog = Arc::new(MemoryCatalogStore::new());
    let record = BackupRecord::new(
        "test",
        CreateBackupRequest::default(),
        vec!["posts".to_string()],
        30,
    );
    let id = record.id.clone();
    catalog.insert_backup(record).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let catalog = catalog.clone();
        let id = id.clone();
        handles.push(tokio::spawn(
            async move { catalog.begin_backup(&id).await },
        ));
    }

    let mut claims = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap().is_some() {
            claims += 1;
        }
    }

    assert_eq!(claims, 1);
}

#[tokio::test]
async fn test_concurrent_exporter_runs_complete_once() {
    init_tracing();
    let catalog = Arc::new(MemoryCatalogStore::new());
    let relational = Arc::new(MemoryRelationalStore::new());
    relational.seed("posts", rows(8));
    let objects = Arc::new(MemoryObjectStore::new());

    let record = BackupRecord::new(
        "test",
        CreateBackupRequest {
            tables: Some(vec!["posts".to_string()]),
            ..CreateBackupRequest::default()
        },
        vec!["posts".to_string()],
        30,
    );
    let id = record.id.clone();
    catalog.insert_backup(record).await.unwrap();

    let exporter = Arc::new(BackupExporter::new(
        catalog.clone(),
        relational,
        objects.clone(),
        VaultConfig::default(),
    ));

    let first = {
        let exporter = exporter.clone();
        let id = id.clone();
        tokio::spawn(async move { exporter.run(&id).await })
    };
    let second = {
        let exporter = exporter.clone();
        let id = id.clone();
        tokio::spawn(async move { exporter.run(&id).await })
    };
    first.await.unwrap();
    second.await.unwrap();

    let done = catalog.get_backup(&id).await.unwrap().unwrap();
    assert_eq!(done.status, BackupStatus::Completed);
    // Exactly one envelope was written for the record.
    assert_eq!(objects.len(), 1);
}
