use crate::catalog::{BackupRecord, BackupStatus, CatalogStore};
use crate::config::VaultConfig;
use crate::export::envelope::{checksum_hex, BackupEnvelope};
use crate::export::ExportError;
use crate::retry::retry_with_backoff;
use crate::store::{ObjectStore, RelationalStore};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Drives a backup record from `Pending` to a terminal state.
///
/// Per-table read failures are soft: the table is skipped, recorded on the
/// record, and the run continues. Anything outside that per-table handling
/// (serialization, upload) fails the whole job.
pub struct BackupExporter {
    catalog: Arc<dyn CatalogStore>,
    relational: Arc<dyn RelationalStore>,
    objects: Arc<dyn ObjectStore>,
    config: VaultConfig,
}

impl BackupExporter {
    /// Create an exporter over the given stores.
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

    /// Object-store path for a backup's envelope.
    pub fn storage_path(backup_id: &str, compressed: bool) -> String {
        if compressed {
            format!("backups/{}.json.gz", backup_id)
        } else {
            format!("backups/{}.json", backup_id)
        }
    }

    /// Claim and process one backup. Never panics and never returns an
    /// error to the dispatcher: the outcome lands on the catalog record.
    #[instrument(skip(self), fields(backup_id = %backup_id))]
    pub async fn run(&self, backup_id: &str) {
        let record = match self.catalog.begin_backup(backup_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!("Backup already claimed or past pending; nothing to do");
                return;
            }
            Err(error) => {
                error!(error = %error, "Failed to claim backup for export");
                return;
            }
        };

        if let Err(error) = self.export(record.clone()).await {
            error!(error = %error, "Export failed");
            let mut failed = record;
            failed.status = BackupStatus::Failed;
            failed.error_message = Some(error.to_string());
            if let Err(update_error) = self.catalog.update_backup(failed).await {
                error!(error = %update_error, "Failed to record export failure");
            }
        }
    }

    async fn export(&self, mut record: BackupRecord) -> Result<(), ExportError> {
        info!(
            backup_type = ?record.backup_type,
            tables = record.tables_included.len(),
            "Starting export"
        );

        let mut envelope = BackupEnvelope::new(Utc::now());
        let mut skipped = Vec::new();
        let mut truncated = Vec::new();

        for table in &record.tables_included {
            let read = retry_with_backoff(
                &self.config.retry,
                self.config.op_timeout,
                "select",
                || self.relational.select(table, self.config.row_cap),
            )
            .await;

            match read {
                Ok(rows) => {
                    if rows.len() >= self.config.row_cap {
                        warn!(
                            table = %table,
                            row_cap = self.config.row_cap,
                            "Table read hit the row cap; captured rows are truncated"
                        );
                        truncated.push(table.clone());
                    }
                    envelope.add_table(table, rows);
                }
                Err(error) => {
                    warn!(table = %table, error = %error, "Skipping unreadable table");
                    skipped.push(table.clone());
                }
            }
        }

        let serialized = envelope.to_bytes()?;
        let payload = if self.config.compression {
            BackupEnvelope::compress(&serialized, self.config.compression_level)?
        } else {
            serialized
        };

        let size_bytes = payload.len() as u64;
        let checksum = checksum_hex(&payload);
        let path = Self::storage_path(&record.id, self.config.compression);
        let content_type = if self.config.compression {
            "application/gzip"
        } else {
            "application/json"
        };

        let payload = Bytes::from(payload);
        retry_with_backoff(
            &self.config.retry,
            self.config.op_timeout,
            "put_envelope",
            || self.objects.put(&path, payload.clone(), content_type),
        )
        .await?;

        record.status = BackupStatus::Completed;
        record.storage_path = Some(path.clone());
        record.size_bytes = Some(size_bytes);
        record.checksum = Some(checksum);
        record.completed_at = Some(Utc::now());
        record.tables_skipped = skipped;
        record.tables_truncated = truncated;

        let captured = envelope.tables.len();
        let total_rows = envelope.total_rows();
        let skipped_count = record.tables_skipped.len();
        self.catalog.update_backup(record).await?;

        info!(
            storage_path = %path,
            size_bytes = size_bytes,
            tables_captured = captured,
            tables_skipped = skipped_count,
            rows = total_rows,
            "Export completed"
        );

        Ok(())
    }
}
