//! Backup and restore job catalog: record types, persistence, and CRUD.
//!
//! The catalog holds job metadata only; it never touches table contents.
//! Catalog operations surface store errors directly to the caller, unlike
//! the soft-fail policy inside export/restore processing.

mod service;
mod store;
mod types;

pub use service::BackupCatalog;
pub use store::{CatalogStore, MemoryCatalogStore};
pub use types::{
    BackupListQuery, BackupPage, BackupRecord, BackupStatus, BackupType, CreateBackupRequest,
    RestoreListQuery, RestoreOptions, RestoreRecord, RestoreStatus,
};

use thiserror::Error;

/// Errors related to catalog records
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No backup record with the given id
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    /// No restore record with the given id
    #[error("Restore not found: {0}")]
    RestoreNotFound(String),

    /// A record with the given id already exists
    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    /// Underlying store failure
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),
}
