use crate::catalog::types::{
    BackupListQuery, BackupPage, BackupRecord, BackupStatus, RestoreListQuery, RestoreRecord,
    RestoreStatus,
};
use crate::catalog::CatalogError;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Persistence for catalog records.
///
/// `begin_backup` and `begin_restore` must perform the `Pending →
/// InProgress` transition atomically: given concurrent callers for the same
/// id, exactly one receives the claimed record and the rest receive `None`.
/// That compare-and-swap is the only path out of `Pending`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Persist a new backup record.
    async fn insert_backup(&self, record: BackupRecord) -> Result<(), CatalogError>;

    /// Fetch a backup record. `None` for a missing id, never an error.
    async fn get_backup(&self, id: &str) -> Result<Option<BackupRecord>, CatalogError>;

    /// Replace a backup record wholesale.
    async fn update_backup(&self, record: BackupRecord) -> Result<(), CatalogError>;

    /// Delete a backup record. Deleting a missing record is a no-op.
    async fn delete_backup(&self, id: &str) -> Result<(), CatalogError>;

    /// Page through backup records, creation time descending.
    async fn list_backups(&self, query: &BackupListQuery) -> Result<BackupPage, CatalogError>;

    /// Atomically claim a pending backup for processing. Returns the record
    /// with status already advanced to `InProgress`, or `None` if it was no
    /// longer pending.
    async fn begin_backup(&self, id: &str) -> Result<Option<BackupRecord>, CatalogError>;

    /// Persist a new restore record.
    async fn insert_restore(&self, record: RestoreRecord) -> Result<(), CatalogError>;

    /// Fetch a restore record. `None` for a missing id.
    async fn get_restore(&self, id: &str) -> Result<Option<RestoreRecord>, CatalogError>;

    /// Replace a restore record wholesale.
    async fn update_restore(&self, record: RestoreRecord) -> Result<(), CatalogError>;

    /// Page through restore records, creation time descending.
    async fn list_restores(&self, query: &RestoreListQuery)
        -> Result<Vec<RestoreRecord>, CatalogError>;

    /// Atomically claim a pending restore for processing.
    async fn begin_restore(&self, id: &str) -> Result<Option<RestoreRecord>, CatalogError>;
}

/// In-memory catalog store backed by concurrent maps.
///
/// The per-key entry lock makes the claim operations a true compare-and-swap.
#[derive(Clone, Default)]
pub struct MemoryCatalogStore {
    backups: Arc<DashMap<String, BackupRecord>>,
    restores: Arc<DashMap<String, RestoreRecord>>,
}

impl MemoryCatalogStore {
    /// Create an empty catalog store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn insert_backup(&self, record: BackupRecord) -> Result<(), CatalogError> {
        if self.backups.contains_key(&record.id) {
            return Err(CatalogError::DuplicateId(record.id));
        }
        self.backups.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_backup(&self, id: &str) -> Result<Option<BackupRecord>, CatalogError> {
        Ok(self.backups.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_backup(&self, record: BackupRecord) -> Result<(), CatalogError> {
        if !self.backups.contains_key(&record.id) {
            return Err(CatalogError::BackupNotFound(record.id));
        }
        self.backups.insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete_backup(&self, id: &str) -> Result<(), CatalogError> {
        self.backups.remove(id);
        Ok(())
    }

    async fn list_backups(&self, query: &BackupListQuery) -> Result<BackupPage, CatalogError> {
        let mut matches: Vec<BackupRecord> = self
            .backups
            .iter()
            .filter(|entry| {
                let record = entry.value();
                query.status.map_or(true, |s| record.status == s)
                    && query.backup_type.map_or(true, |t| record.backup_type == t)
            })
            .map(|entry| entry.value().clone())
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matches.len();
        let records = matches
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        Ok(BackupPage { records, total })
    }

    async fn begin_backup(&self, id: &str) -> Result<Option<BackupRecord>, CatalogError> {
        match self.backups.get_mut(id) {
            Some(mut entry) => {
                if entry.status == BackupStatus::Pending {
                    entry.status = BackupStatus::InProgress;
                    Ok(Some(entry.clone()))
                } else {
                    Ok(None)
                }
            }
            None => Err(CatalogError::BackupNotFound(id.to_string())),
        }
    }

    async fn insert_restore(&self, record: RestoreRecord) -> Result<(), CatalogError> {
        if self.restores.contains_key(&record.id) {
            return Err(CatalogError::DuplicateId(record.id));
        }
        self.restores.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_restore(&self, id: &str) -> Result<Option<RestoreRecord>, CatalogError> {
        Ok(self.restores.get(id).map(|entry| entry.value().clone()))
    }

    async fn update_restore(&self, record: RestoreRecord) -> Result<(), CatalogError> {
        if !self.restores.contains_key(&record.id) {
            return Err(CatalogError::RestoreNotFound(record.id));
        }
        self.restores.insert(record.id.clone(), record);
        Ok(())
    }

    async fn list_restores(
        &self,
        query: &RestoreListQuery,
    ) -> Result<Vec<RestoreRecord>, CatalogError> {
        let mut matches: Vec<RestoreRecord> = self
            .restores
            .iter()
            .filter(|entry| {
                let record = entry.value();
                query
                    .backup_id
                    .as_deref()
                    .map_or(true, |id| record.backup_id == id)
                    && query.status.map_or(true, |s| record.status == s)
            })
            .map(|entry| entry.value().clone())
            .collect();

        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matches
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect())
    }

    async fn begin_restore(&self, id: &str) -> Result<Option<RestoreRecord>, CatalogError> {
        match self.restores.get_mut(id) {
            Some(mut entry) => {
                if entry.status == RestoreStatus::Pending {
                    entry.status = RestoreStatus::InProgress;
                    entry.started_at = Some(chrono::Utc::now());
                    Ok(Some(entry.clone()))
                } else {
                    Ok(None)
                }
            }
            None => Err(CatalogError::RestoreNotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::CreateBackupRequest;

    fn pending_record() -> BackupRecord {
        BackupRecord::new(
            "test",
            CreateBackupRequest::default(),
            vec!["posts".to_string()],
            30,
        )
    }

    #[tokio::test]
    async fn begin_backup_claims_exactly_once() {
        let store = MemoryCatalogStore::new();
        let record = pending_record();
        let id = record.id.clone();
        store.insert_backup(record).await.unwrap();

        let first = store.begin_backup(&id).await.unwrap();
        let second = store.begin_backup(&id).await.unwrap();

        assert_eq!(first.unwrap().status, BackupStatus::InProgress);
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn delete_missing_backup_is_noop() {
        let store = MemoryCatalogStore::new();
        store.delete_backup("nope").await.unwrap();
    }

    #[tokio::test]
    async fn list_orders_newest_first_with_total() {
        let store = MemoryCatalogStore::new();
        for _ in 0..3 {
            store.insert_backup(pending_record()).await.unwrap();
        }

        let page = store
            .list_backups(&BackupListQuery::default().with_limit(2))
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(page.records.len(), 2);
        assert!(page.records[0].created_at >= page.records[1].created_at);
    }
}
