//! Retention sweeping: expired completed backups are deleted, blob and
//! catalog record both.
//!
//! The sweeper is driven by an external scheduler; it only touches catalog
//! entries and delegates blob deletion to the catalog's delete path.

use crate::catalog::{BackupCatalog, BackupListQuery, BackupStatus, CatalogError};
use chrono::Utc;
use tracing::{info, instrument, warn};

/// Result of one retention sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Backups deleted this sweep
    pub deleted: usize,
    /// Backups that matched but could not be deleted
    pub failed: usize,
}

/// Deletes completed backups whose retention window has elapsed.
pub struct RetentionSweeper<'a> {
    catalog: &'a BackupCatalog,
}

impl<'a> RetentionSweeper<'a> {
    /// Create a sweeper over the given catalog.
    pub fn new(catalog: &'a BackupCatalog) -> Self {
        Self { catalog }
    }

    /// Delete every `Completed` backup with `expires_at` in the past.
    ///
    /// Only completed records are eligible: pending, in-progress, and failed
    /// records are left alone regardless of their `expires_at`. A failure on
    /// one record is logged and does not abort the sweep of the rest.
    #[instrument(skip(self))]
    pub async fn cleanup_expired_backups(&self) -> Result<SweepOutcome, CatalogError> {
        let now = Utc::now();
        let mut outcome = SweepOutcome::default();
        let page_size = 100;
        let mut offset = 0;

        // Expired candidates collected first so deletions do not shift the
        // pages under the listing.
        let mut expired = Vec::new();
        loop {
            let page = self
                .catalog
                .list_backups(
                    &BackupListQuery::default()
                        .with_status(BackupStatus::Completed)
                        .with_limit(page_size)
                        .with_offset(offset),
                )
                .await?;

            let fetched = page.records.len();
            for record in page.records {
                if record.is_expired_at(now) {
                    expired.push(record);
                }
            }

            offset += fetched;
            if fetched < page_size {
                break;
            }
        }

        for mut record in expired {
            let id = record.id.clone();

            // Mark the record expired before deleting it so observers see
            // the out-of-band transition.
            record.status = BackupStatus::Expired;
            if let Err(error) = self.catalog.store().update_backup(record).await {
                warn!(backup_id = %id, error = %error, "Failed to mark backup expired");
                outcome.failed += 1;
                continue;
            }

            match self.catalog.delete_backup(&id).await {
                Ok(()) => outcome.deleted += 1,
                Err(error) => {
                    warn!(backup_id = %id, error = %error, "Failed to delete expired backup");
                    outcome.failed += 1;
                }
            }
        }

        info!(
            deleted = outcome.deleted,
            failed = outcome.failed,
            "Retention sweep finished"
        );
        Ok(outcome)
    }
}
