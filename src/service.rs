//! The composition facade: wires the catalog, exporter, restore engine, and
//! sweeper over caller-supplied stores, and owns background job dispatch.

use crate::catalog::{
    BackupCatalog, BackupListQuery, BackupPage, BackupRecord, BackupType, CatalogError,
    CatalogStore, CreateBackupRequest, RestoreListQuery, RestoreOptions, RestoreRecord,
};
use crate::config::VaultConfig;
use crate::export::{checksum_hex, BackupExporter};
use crate::restore::{RestoreEngine, RestoreError};
use crate::retention::{RetentionSweeper, SweepOutcome};
use crate::store::{ObjectStore, RelationalStore};
use crate::tables::TableSetPolicy;
use crate::task::JobTracker;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Retention window for scheduler-driven backups, in days.
const SCHEDULED_RETENTION_DAYS: u32 = 30;

/// Result of verifying a stored backup envelope against its record.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    /// The verified backup
    pub backup_id: String,
    /// Recomputed checksum matches the recorded one
    pub checksum_match: bool,
    /// Stored blob length matches the recorded size
    pub size_match: bool,
}

impl VerificationOutcome {
    /// Whether the stored envelope is intact.
    pub fn is_valid(&self) -> bool {
        self.checksum_match && self.size_match
    }
}

/// Facade over the backup & restore subsystem.
///
/// Creation calls persist a `Pending` record, dispatch processing as a
/// tracked background task, and return the record immediately; processing
/// outcomes are observed by polling [`get_backup`](Self::get_backup) /
/// [`get_restore`](Self::get_restore), or by awaiting the job via
/// [`jobs`](Self::jobs).
pub struct BackupService {
    relational: Arc<dyn RelationalStore>,
    objects: Arc<dyn ObjectStore>,
    catalog_store: Arc<dyn CatalogStore>,
    catalog: BackupCatalog,
    config: VaultConfig,
    tracker: JobTracker,
}

impl BackupService {
    /// Create a service with default configuration and table policy.
    pub fn new(
        relational: Arc<dyn RelationalStore>,
        objects: Arc<dyn ObjectStore>,
        catalog_store: Arc<dyn CatalogStore>,
    ) -> Self {
        Self::with_parts(
            relational,
            objects,
            catalog_store,
            VaultConfig::default(),
            TableSetPolicy::default(),
        )
    }

    /// Create a service with explicit configuration and table policy.
    pub fn with_parts(
        relational: Arc<dyn RelationalStore>,
        objects: Arc<dyn ObjectStore>,
        catalog_store: Arc<dyn CatalogStore>,
        config: VaultConfig,
        policy: TableSetPolicy,
    ) -> Self {
        let catalog = BackupCatalog::new(
            catalog_store.clone(),
            objects.clone(),
            policy,
            config.default_retention_days,
        );
        Self {
            relational,
            objects,
            catalog_store,
            catalog,
            config,
            tracker: JobTracker::new(),
        }
    }

    /// Create a backup record and dispatch the export.
    ///
    /// Returns the `Pending` record as persisted; export failures are not
    /// surfaced here, only on the record itself.
    pub async fn create_backup(
        &self,
        initiator: &str,
        request: CreateBackupRequest,
    ) -> Result<BackupRecord, CatalogError> {
        let record = self.catalog.create_backup_record(initiator, request).await?;

        let exporter = Arc::new(self.exporter());
        let id = record.id.clone();
        self.tracker.dispatch(&record.id, async move {
            exporter.run(&id).await;
        });

        Ok(record)
    }

    /// Page through backup records, newest first.
    pub async fn list_backups(&self, query: &BackupListQuery) -> Result<BackupPage, CatalogError> {
        self.catalog.list_backups(query).await
    }

    /// Fetch one backup record; `None` for a missing id.
    pub async fn get_backup(&self, id: &str) -> Result<Option<BackupRecord>, CatalogError> {
        self.catalog.get_backup(id).await
    }

    /// Delete a backup's blob and record. Safe to call twice.
    pub async fn delete_backup(&self, id: &str) -> Result<(), CatalogError> {
        self.catalog.delete_backup(id).await
    }

    /// Create a restore record for a completed backup and dispatch
    /// processing (a dry run dispatches the validation pass instead).
    pub async fn restore_from_backup(
        &self,
        backup_id: &str,
        initiator: &str,
        options: RestoreOptions,
    ) -> Result<RestoreRecord, RestoreError> {
        let engine = Arc::new(self.restore_engine());
        let record = engine.create_restore(backup_id, initiator, options).await?;

        let id = record.id.clone();
        self.tracker.dispatch(&record.id, async move {
            engine.run(&id).await;
        });

        Ok(record)
    }

    /// Fetch one restore record; `None` for a missing id.
    pub async fn get_restore(&self, id: &str) -> Result<Option<RestoreRecord>, CatalogError> {
        self.catalog.get_restore(id).await
    }

    /// Page through restore records, newest first.
    pub async fn list_restores(
        &self,
        query: &RestoreListQuery,
    ) -> Result<Vec<RestoreRecord>, CatalogError> {
        self.catalog.list_restores(query).await
    }

    /// Re-download a completed backup's envelope and check it against the
    /// record's checksum and size.
    pub async fn verify_backup(&self, id: &str) -> Result<VerificationOutcome, RestoreError> {
        let record = self
            .catalog
            .get_backup(id)
            .await?
            .ok_or_else(|| RestoreError::BackupNotFound(id.to_string()))?;

        let path = record
            .storage_path
            .as_deref()
            .ok_or_else(|| RestoreError::MissingEnvelope(id.to_string()))?;

        let payload = self.objects.get(path).await?;

        Ok(VerificationOutcome {
            backup_id: id.to_string(),
            checksum_match: record
                .checksum
                .as_deref()
                .map_or(false, |expected| checksum_hex(&payload) == expected),
            size_match: record
                .size_bytes
                .map_or(false, |size| size == payload.len() as u64),
        })
    }

    /// Delete expired completed backups. Intended for an external scheduler.
    pub async fn cleanup_expired_backups(&self) -> Result<SweepOutcome, CatalogError> {
        RetentionSweeper::new(&self.catalog)
            .cleanup_expired_backups()
            .await
    }

    /// Create a date-stamped full backup with the fixed scheduler defaults.
    /// Intended for an external scheduler.
    pub async fn run_scheduled_backup(&self) -> Result<BackupRecord, CatalogError> {
        let name = format!("scheduled-backup-{}", Utc::now().format("%Y-%m-%d"));
        info!(name = %name, "Running scheduled backup");

        self.create_backup(
            "scheduler",
            CreateBackupRequest {
                name: Some(name),
                backup_type: BackupType::Full,
                retention_days: Some(SCHEDULED_RETENTION_DAYS),
                ..CreateBackupRequest::default()
            },
        )
        .await
    }

    /// The background job tracker, for awaiting or aborting dispatched
    /// export and restore runs.
    pub fn jobs(&self) -> &JobTracker {
        &self.tracker
    }

    /// The catalog in force.
    pub fn catalog(&self) -> &BackupCatalog {
        &self.catalog
    }

    /// The configuration in force.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    fn exporter(&self) -> BackupExporter {
        BackupExporter::new(
            self.catalog_store.clone(),
            self.relational.clone(),
            self.objects.clone(),
            self.config.clone(),
        )
    }

    fn restore_engine(&self) -> RestoreEngine {
        RestoreEngine::new(
            self.catalog_store.clone(),
            self.relational.clone(),
            self.objects.clone(),
            self.config.clone(),
        )
    }
}
