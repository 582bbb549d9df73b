//! # Pressvault
//!
//! Backup and restore engine for the publishing platform. Pressvault keeps a
//! catalog of backup and restore jobs, snapshots a configurable set of content
//! tables into a single durable envelope blob, replays an envelope back into
//! the live tables, and sweeps expired backups on a retention schedule.
//!
//! ## Overview
//!
//! The crate is a library core: it consumes a relational store (table-oriented
//! select/insert/delete) and an object store (blob put/get/delete) through
//! trait seams, and exposes its job records to an external scheduler and admin
//! surface. Export and restore run as background tasks; callers get the
//! `pending` record back immediately and poll for the outcome.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use pressvault::catalog::{CreateBackupRequest, MemoryCatalogStore};
//! use pressvault::store::memory::{MemoryObjectStore, MemoryRelationalStore};
//! use pressvault::service::BackupService;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let relational = Arc::new(MemoryRelationalStore::new());
//! let objects = Arc::new(MemoryObjectStore::new());
//! let catalog = Arc::new(MemoryCatalogStore::new());
//!
//! let service = BackupService::new(relational, objects, catalog);
//!
//! // Returns the pending record; export continues in the background.
//! let record = service
//!     .create_backup("admin", CreateBackupRequest::default())
//!     .await?;
//!
//! service.jobs().wait(&record.id).await;
//! let done = service.get_backup(&record.id).await?;
//! assert!(done.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Key Features
//!
//! - **Job catalog**: backup and restore records with explicit state machines
//! - **Bounded export**: capped per-table reads with truncation markers
//! - **Safe restore**: per-table snapshot, batched replace, rollback on failure
//! - **Retention sweeping**: expired completed backups are deleted on schedule
//! - **Observable dispatch**: background jobs carry trackable, abortable handles
//!
//! ## Modules
//!
//! - [`catalog`]: backup/restore job records and CRUD over them
//! - [`tables`]: static policy mapping a backup type to its table set
//! - [`export`]: the exporter job and the envelope wire format
//! - [`restore`]: the restore engine with per-table snapshot rollback
//! - [`retention`]: the expired-backup sweeper
//! - [`store`]: relational/object store collaborator contracts
//! - [`service`]: the composition facade wiring everything together
//! - [`task`]: trackable background job dispatch

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

use thiserror::Error;

/// Result type for pressvault operations
pub type Result<T> = std::result::Result<T, PressvaultError>;

/// Main error type for pressvault operations
#[derive(Error, Debug)]
pub enum PressvaultError {
    /// Catalog record error
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    /// Relational or object store error
    #[error("Store error: {0}")]
    Store(#[from] store::StoreError),

    /// Export job error
    #[error("Export error: {0}")]
    Export(#[from] export::ExportError),

    /// Restore job error
    #[error("Restore error: {0}")]
    Restore(#[from] restore::RestoreError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Join error from async tasks
    #[error("Async join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Backup and restore job catalog
pub mod catalog;

/// Runtime configuration with documented defaults
pub mod config;

/// Exporter job and the envelope wire format
pub mod export;

/// Restore engine
pub mod restore;

/// Retention sweeper and scheduled-backup entry points
pub mod retention;

/// Retry with exponential backoff for transient store failures
pub mod retry;

/// Composition facade
pub mod service;

/// Relational and object store collaborator contracts
pub mod store;

/// Table set resolution policy
pub mod tables;

/// Background job dispatch and tracking
pub mod task;

pub use catalog::{BackupRecord, BackupStatus, BackupType, RestoreRecord, RestoreStatus};
pub use config::VaultConfig;
pub use service::BackupService;
