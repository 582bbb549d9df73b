use crate::catalog::types::{
    BackupListQuery, BackupPage, BackupRecord, CreateBackupRequest, RestoreListQuery,
    RestoreRecord,
};
use crate::catalog::{CatalogError, CatalogStore};
use crate::catalog::types::BackupType;
use crate::store::ObjectStore;
use crate::tables::TableSetPolicy;
use std::sync::Arc;
use tracing::{info, warn};

/// CRUD over backup and restore records.
///
/// The catalog resolves table sets and retention at creation time and owns
/// record deletion (blob first, then row). It performs no table I/O and
/// never dispatches processing itself; the [`crate::service::BackupService`]
/// facade hands newly created records to the exporter and restore engine.
pub struct BackupCatalog {
    store: Arc<dyn CatalogStore>,
    objects: Arc<dyn ObjectStore>,
    policy: TableSetPolicy,
    default_retention_days: u32,
}

impl BackupCatalog {
    /// Create a catalog over the given stores.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        objects: Arc<dyn ObjectStore>,
        policy: TableSetPolicy,
        default_retention_days: u32,
    ) -> Self {
        Self {
            store,
            objects,
            policy,
            default_retention_days,
        }
    }

    /// Create a `Pending` backup record.
    ///
    /// Tables come from the request when given, otherwise from the table-set
    /// policy for the requested type. `expires_at` is fixed here and never
    /// recomputed.
    pub async fn create_backup_record(
        &self,
        initiator: &str,
        request: CreateBackupRequest,
    ) -> Result<BackupRecord, CatalogError> {
        let tables = self
            .policy
            .resolve(request.backup_type, request.tables.clone());
        let retention_days = request
            .retention_days
            .unwrap_or(self.default_retention_days);

        let record = BackupRecord::new(initiator, request, tables, retention_days);
        self.store.insert_backup(record.clone()).await?;

        info!(
            backup_id = %record.id,
            backup_type = ?record.backup_type,
            tables = record.tables_included.len(),
            retention_days = retention_days,
            initiated_by = %record.initiated_by,
            "Backup record created"
        );

        Ok(record)
    }

    /// Page through backup records, newest first.
    pub async fn list_backups(&self, query: &BackupListQuery) -> Result<BackupPage, CatalogError> {
        self.store.list_backups(query).await
    }

    /// Fetch one backup record; `None` for a missing id.
    pub async fn get_backup(&self, id: &str) -> Result<Option<BackupRecord>, CatalogError> {
        self.store.get_backup(id).await
    }

    /// Delete a backup record and its envelope blob.
    ///
    /// The blob is deleted first; a failure there is logged and does not
    /// block the record delete. The record delete is unconditional, with no
    /// status guard, and calling this twice for the same id is safe.
    pub async fn delete_backup(&self, id: &str) -> Result<(), CatalogError> {
        if let Some(record) = self.store.get_backup(id).await? {
            if let Some(path) = &record.storage_path {
                if let Err(error) = self.objects.delete(path).await {
                    warn!(
                        backup_id = %id,
                        storage_path = %path,
                        error = %error,
                        "Failed to delete backup blob; removing catalog record anyway"
                    );
                }
            }
        }

        self.store.delete_backup(id).await?;
        info!(backup_id = %id, "Backup record deleted");
        Ok(())
    }

    /// Fetch one restore record; `None` for a missing id.
    pub async fn get_restore(&self, id: &str) -> Result<Option<RestoreRecord>, CatalogError> {
        self.store.get_restore(id).await
    }

    /// Page through restore records, newest first.
    pub async fn list_restores(
        &self,
        query: &RestoreListQuery,
    ) -> Result<Vec<RestoreRecord>, CatalogError> {
        self.store.list_restores(query).await
    }

    /// The table-set policy in force.
    pub fn policy(&self) -> &TableSetPolicy {
        &self.policy
    }

    /// Tables a backup of the given type would include today.
    pub fn tables_for(&self, backup_type: BackupType) -> Vec<String> {
        self.policy.resolve(backup_type, None)
    }

    pub(crate) fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }
}
