use crate::catalog::{
    BackupRecord, BackupStatus, CatalogStore, RestoreOptions, RestoreRecord, RestoreStatus,
};
use crate::config::VaultConfig;
use crate::export::{checksum_hex, BackupEnvelope};
use crate::restore::RestoreError;
use crate::retry::retry_with_backoff;
use crate::store::{ObjectStore, RelationalStore, Row};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// A table replacement that did not complete.
struct TableFailure {
    cause: RestoreError,
    /// Whether the failing table was restored to its snapshot. False means
    /// the table is in an inconsistent state and the run cannot claim a
    /// clean rollback.
    table_reverted: bool,
}

/// Creates restore records and drives them from `Pending` to a terminal
/// state.
pub struct RestoreEngine {
    catalog: Arc<dyn CatalogStore>,
    relational: Arc<dyn RelationalStore>,
    objects: Arc<dyn ObjectStore>,
    config: VaultConfig,
}

impl RestoreEngine {
    /// Create a restore engine over the given stores.
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        relational: Arc<dyn RelationalStore>,
        objects: Arc<dyn ObjectStore>,
        config: VaultConfig,
    ) -> Self {
        Self {
            catalog,
            relational,
            objects,
            config,
        }
    }

    /// Create a `Pending` restore record referencing `backup_id`.
    ///
    /// Rejected without creating any record unless the backup's status is
    /// `Completed` right now; the check is not repeated during processing.
    /// `tables_restored` is fixed here: the explicit subset when given,
    /// otherwise the backup's full table list.
    pub async fn create_restore(
        &self,
        backup_id: &str,
        initiator: &str,
        options: RestoreOptions,
    ) -> Result<RestoreRecord, RestoreError> {
        let backup = self
            .catalog
            .get_backup(backup_id)
            .await?
            .ok_or_else(|| RestoreError::BackupNotFound(backup_id.to_string()))?;

        if backup.status != BackupStatus::Completed {
            return Err(RestoreError::BackupNotRestorable {
                id: backup_id.to_string(),
                status: backup.status,
            });
        }

        let tables = options
            .tables
            .unwrap_or_else(|| backup.tables_included.clone());
        let record = RestoreRecord::new(backup_id, initiator, tables, options.dry_run);
        self.catalog.insert_restore(record.clone()).await?;

        info!(
            restore_id = %record.id,
            backup_id = %backup_id,
            tables = record.tables_restored.len(),
            dry_run = record.dry_run,
            initiated_by = %initiator,
            "Restore record created"
        );

        Ok(record)
    }

    /// Claim and process one restore. The outcome lands on the catalog
    /// record; nothing is returned to the dispatcher.
    #[instrument(skip(self), fields(restore_id = %restore_id))]
    pub async fn run(&self, restore_id: &str) {
        let record = match self.catalog.begin_restore(restore_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("Restore already claimed or past pending; nothing to do");
                return;
            }
            Err(error) => {
                error!(error = %error, "Failed to claim restore for processing");
                return;
            }
        };

        let outcome = if record.dry_run {
            self.validate(record.clone()).await
        } else {
            self.process(record.clone()).await
        };

        if let Err(error) = outcome {
            error!(error = %error, "Restore failed");
            let mut failed = record;
            failed.status = RestoreStatus::Failed;
            failed.error_message = Some(error.to_string());
            if let Err(update_error) = self.catalog.update_restore(failed).await {
                error!(error = %update_error, "Failed to record restore failure");
            }
        }
    }

    /// Fetch, verify, and parse the source backup's envelope.
    async fn fetch_envelope(
        &self,
        backup: &BackupRecord,
    ) -> Result<BackupEnvelope, RestoreError> {
        let path = backup
            .storage_path
            .as_deref()
            .ok_or_else(|| RestoreError::MissingEnvelope(backup.id.clone()))?;

        let payload = retry_with_backoff(
            &self.config.retry,
            self.config.op_timeout,
            "get_envelope",
            || self.objects.get(path),
        )
        .await?;

        if let Some(expected) = &backup.checksum {
            if &checksum_hex(&payload) != expected {
                return Err(RestoreError::ChecksumMismatch(backup.id.clone()));
            }
        }

        Ok(BackupEnvelope::from_bytes(&payload)?)
    }

    /// Dry run: verify the envelope and count rows without touching any
    /// table.
    async fn validate(&self, mut record: RestoreRecord) -> Result<(), RestoreError> {
        let backup = self.source_backup(&record).await?;
        let envelope = self.fetch_envelope(&backup).await?;

        let mut skipped = Vec::new();
        let mut available_rows: u64 = 0;
        for table in &record.tables_restored {
            match envelope.rows_for(table) {
                Some(rows) => available_rows += rows.len() as u64,
                None => skipped.push(table.clone()),
            }
        }

        record.status = RestoreStatus::Completed;
        record.completed_at = Some(Utc::now());
        record.tables_skipped = skipped;
        let skipped_count = record.tables_skipped.len();
        self.catalog.update_restore(record).await?;

        info!(
            available_rows = available_rows,
            tables_missing = skipped_count,
            "Dry-run validation completed; no tables were modified"
        );
        Ok(())
    }

    async fn process(&self, mut record: RestoreRecord) -> Result<(), RestoreError> {
        let backup = self.source_backup(&record).await?;
        let envelope = self.fetch_envelope(&backup).await?;

        let mut restored: u64 = 0;
        let mut skipped = Vec::new();
        // Snapshots of tables already replaced, for whole-run rollback.
        let mut replaced: Vec<(String, Vec<Row>)> = Vec::new();

        let targets = record.tables_restored.clone();
        for table in &targets {
            let Some(rows) = envelope.rows_for(table) else {
                skipped.push(table.clone());
                continue;
            };

            // No complete snapshot means no safe way to revert, so leave the
            // table untouched rather than risk a half-replaced state.
            let snapshot = match retry_with_backoff(
                &self.config.retry,
                self.config.op_timeout,
                "snapshot",
                || self.relational.select(table, self.config.row_cap),
            )
            .await
            {
                Ok(snapshot) => snapshot,
                Err(error) => {
                    warn!(table = %table, error = %error, "Cannot snapshot table; skipping it");
                    skipped.push(table.clone());
                    continue;
                }
            };

            // A snapshot at the cap may be missing rows, so the table could
            // not be reverted faithfully after a failure.
            if snapshot.len() >= self.config.row_cap {
                warn!(
                    table = %table,
                    row_cap = self.config.row_cap,
                    "Table exceeds the snapshot cap; skipping it"
                );
                skipped.push(table.clone());
                continue;
            }

            match self.replace_table(table, rows, &snapshot).await {
                Ok(count) => {
                    restored += count;
                    replaced.push((table.clone(), snapshot));
                }
                Err(failure) => {
                    return self.rollback(record, replaced, failure).await;
                }
            }
        }

        record.status = RestoreStatus::Completed;
        record.records_restored = restored;
        record.tables_skipped = skipped;
        record.completed_at = Some(Utc::now());
        let tables_replaced = replaced.len();
        let tables_skipped = record.tables_skipped.len();
        self.catalog.update_restore(record).await?;

        info!(
            records_restored = restored,
            tables_replaced = tables_replaced,
            tables_skipped = tables_skipped,
            "Restore completed"
        );
        Ok(())
    }

    /// Replace one table's contents with the envelope rows.
    ///
    /// On any failure the table is reverted from `snapshot` before this
    /// returns; the failure records whether that revert succeeded.
    async fn replace_table(
        &self,
        table: &str,
        rows: &[Row],
        snapshot: &[Row],
    ) -> Result<u64, TableFailure> {
        if let Err(error) = retry_with_backoff(
            &self.config.retry,
            self.config.op_timeout,
            "delete_all",
            || self.relational.delete_all(table),
        )
        .await
        {
            warn!(table = %table, error = %error, "Failed to clear table; reverting");
            return Err(self.fail_table(table, snapshot, RestoreError::Store(error)).await);
        }

        let mut inserted: u64 = 0;
        for batch in rows.chunks(self.config.insert_batch_size) {
            match retry_with_backoff(
                &self.config.retry,
                self.config.op_timeout,
                "insert_batch",
                || self.relational.insert(table, batch),
            )
            .await
            {
                Ok(count) => inserted += count as u64,
                Err(error) => {
                    warn!(
                        table = %table,
                        inserted = inserted,
                        error = %error,
                        "Batch insert failed; reverting table"
                    );
                    return Err(self
                        .fail_table(table, snapshot, RestoreError::Store(error))
                        .await);
                }
            }
        }

        Ok(inserted)
    }

    /// Revert a failed table and package the failure.
    async fn fail_table(
        &self,
        table: &str,
        snapshot: &[Row],
        cause: RestoreError,
    ) -> TableFailure {
        match self.revert_table(table, snapshot).await {
            Ok(()) => TableFailure {
                cause,
                table_reverted: true,
            },
            Err(revert_error) => {
                error!(table = %table, error = %revert_error, "Table revert failed");
                TableFailure {
                    cause,
                    table_reverted: false,
                }
            }
        }
    }

    /// Restore a table to its pre-restore snapshot.
    async fn revert_table(&self, table: &str, snapshot: &[Row]) -> Result<(), RestoreError> {
        retry_with_backoff(
            &self.config.retry,
            self.config.op_timeout,
            "revert_clear",
            || self.relational.delete_all(table),
        )
        .await?;

        for batch in snapshot.chunks(self.config.insert_batch_size) {
            retry_with_backoff(
                &self.config.retry,
                self.config.op_timeout,
                "revert_insert",
                || self.relational.insert(table, batch),
            )
            .await?;
        }

        Ok(())
    }

    /// Revert every table replaced earlier in the run. `RolledBack` is
    /// claimed only when the failing table and every previously replaced
    /// table are back at their snapshots; otherwise the run is `Failed`.
    async fn rollback(
        &self,
        mut record: RestoreRecord,
        replaced: Vec<(String, Vec<Row>)>,
        failure: TableFailure,
    ) -> Result<(), RestoreError> {
        let mut reverted_all = failure.table_reverted;
        for (table, snapshot) in replaced.iter().rev() {
            if let Err(error) = self.revert_table(table, snapshot).await {
                error!(table = %table, error = %error, "Rollback revert failed");
                reverted_all = false;
            }
        }

        record.status = if reverted_all {
            RestoreStatus::RolledBack
        } else {
            RestoreStatus::Failed
        };
        record.records_restored = 0;
        record.error_message = Some(failure.cause.to_string());
        record.completed_at = Some(Utc::now());
        let status = record.status;
        self.catalog.update_restore(record).await?;

        warn!(status = ?status, error = %failure.cause, "Restore aborted");
        Ok(())
    }

    async fn source_backup(&self, record: &RestoreRecord) -> Result<BackupRecord, RestoreError> {
        self.catalog
            .get_backup(&record.backup_id)
            .await?
            .ok_or_else(|| RestoreError::BackupNotFound(record.backup_id.clone()))
    }
}
