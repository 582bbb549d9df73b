use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Scope of a backup's table set.
///
/// `Incremental` is a label only: it selects the same core table set as
/// `Selective` and carries no row-level delta semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupType {
    /// All known tables
    Full,
    /// Core tables (label only; behaves like `Selective`)
    Incremental,
    /// Core tables, or an explicit list supplied at creation
    Selective,
}

/// Lifecycle state of a backup job.
///
/// Transitions follow `Pending → InProgress → {Completed, Failed}`.
/// `Expired` is assigned out-of-band by the retention sweeper after
/// `Completed`, never by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupStatus {
    /// Created, not yet claimed by the exporter
    Pending,
    /// Claimed by exactly one exporter run
    InProgress,
    /// Envelope uploaded and record finalized
    Completed,
    /// Export aborted with an error
    Failed,
    /// Past its retention window; about to be deleted by the sweeper
    Expired,
}

/// Lifecycle state of a restore job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreStatus {
    /// Created, not yet claimed by the restore engine
    Pending,
    /// Claimed by exactly one restore run
    InProgress,
    /// All requested tables processed
    Completed,
    /// Restore aborted; touched tables could not be reverted
    Failed,
    /// Restore aborted mid-run and every touched table was reverted to its
    /// pre-restore snapshot
    RolledBack,
}

/// A backup job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Unique record id
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Table-set scope
    pub backup_type: BackupType,
    /// Current lifecycle state
    pub status: BackupStatus,
    /// Tables resolved at creation time; fixed thereafter
    pub tables_included: Vec<String>,
    /// Tables listed in `tables_included` that the export could not read.
    /// Non-empty on a `Completed` record means partial coverage.
    pub tables_skipped: Vec<String>,
    /// Tables whose read returned exactly the row cap. The marker is
    /// conservative: a table holding exactly cap rows is listed even though
    /// nothing was cut.
    pub tables_truncated: Vec<String>,
    /// Object-store path of the envelope; set only once `Completed`
    pub storage_path: Option<String>,
    /// Uploaded envelope size; approximate, computed from serialized length
    pub size_bytes: Option<u64>,
    /// SHA-256 of the uploaded envelope bytes
    pub checksum: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Terminal-transition time for `Completed`
    pub completed_at: Option<DateTime<Utc>>,
    /// Fixed at creation as `created_at + retention_days`; never recomputed
    pub expires_at: DateTime<Utc>,
    /// Set only on failure
    pub error_message: Option<String>,
    /// Who or what created the record
    pub initiated_by: String,
    /// Free-form metadata
    pub metadata: serde_json::Map<String, Value>,
}

impl BackupRecord {
    /// Build a new `Pending` record from a creation request.
    pub fn new(
        initiator: &str,
        request: CreateBackupRequest,
        tables: Vec<String>,
        retention_days: u32,
    ) -> Self {
        let created_at = Utc::now();
        let name = request
            .name
            .unwrap_or_else(|| format!("backup-{}", created_at.format("%Y-%m-%d-%H%M%S")));

        Self {
            id: Uuid::new_v4().to_string(),
            name,
            description: request.description,
            backup_type: request.backup_type,
            status: BackupStatus::Pending,
            tables_included: tables,
            tables_skipped: Vec::new(),
            tables_truncated: Vec::new(),
            storage_path: None,
            size_bytes: None,
            checksum: None,
            created_at,
            completed_at: None,
            expires_at: created_at + Duration::days(i64::from(retention_days)),
            error_message: None,
            initiated_by: initiator.to_string(),
            metadata: request.metadata,
        }
    }

    /// Whether the retention window has elapsed as of `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// A restore job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreRecord {
    /// Unique record id
    pub id: String,
    /// The backup this restore replays
    pub backup_id: String,
    /// Current lifecycle state
    pub status: RestoreStatus,
    /// Tables targeted by this restore; fixed at creation
    pub tables_restored: Vec<String>,
    /// Targeted tables that were skipped at runtime: absent from the
    /// envelope, unreadable when taking the pre-restore snapshot, or too
    /// large to snapshot within the row cap
    pub tables_skipped: Vec<String>,
    /// Successfully inserted rows across all fully-restored tables
    pub records_restored: u64,
    /// Validation-only run: parse and count, mutate nothing
    pub dry_run: bool,
    /// Who or what created the record
    pub initiated_by: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Set when processing claims the record
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal-transition time for `Completed`
    pub completed_at: Option<DateTime<Utc>>,
    /// Set only on failure or rollback
    pub error_message: Option<String>,
}

impl RestoreRecord {
    /// Build a new `Pending` restore record.
    pub fn new(backup_id: &str, initiator: &str, tables: Vec<String>, dry_run: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            backup_id: backup_id.to_string(),
            status: RestoreStatus::Pending,
            tables_restored: tables,
            tables_skipped: Vec::new(),
            records_restored: 0,
            dry_run,
            initiated_by: initiator.to_string(),
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            error_message: None,
        }
    }
}

/// Parameters for creating a backup record.
#[derive(Debug, Clone, Default)]
pub struct CreateBackupRequest {
    /// Human-readable name; defaults to a date-stamped one
    pub name: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Table-set scope; defaults to `Full`
    pub backup_type: BackupType,
    /// Explicit table list; always wins over type-based resolution
    pub tables: Option<Vec<String>>,
    /// Retention window in days; defaults to the configured value
    pub retention_days: Option<u32>,
    /// Free-form metadata stored on the record
    pub metadata: serde_json::Map<String, Value>,
}

impl Default for BackupType {
    fn default() -> Self {
        BackupType::Full
    }
}

/// Options for a restore request.
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    /// Explicit subset of tables to restore; defaults to the source
    /// backup's full table set
    pub tables: Option<Vec<String>>,
    /// Validate the envelope without mutating any table
    pub dry_run: bool,
}

/// Filter and pagination for listing backup records.
#[derive(Debug, Clone)]
pub struct BackupListQuery {
    /// Exact-match status filter
    pub status: Option<BackupStatus>,
    /// Exact-match type filter
    pub backup_type: Option<BackupType>,
    /// Page size
    pub limit: usize,
    /// Offset into the creation-time-descending ordering
    pub offset: usize,
}

impl Default for BackupListQuery {
    fn default() -> Self {
        Self {
            status: None,
            backup_type: None,
            limit: 50,
            offset: 0,
        }
    }
}

impl BackupListQuery {
    /// Filter by status.
    pub fn with_status(mut self, status: BackupStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by backup type.
    pub fn with_type(mut self, backup_type: BackupType) -> Self {
        self.backup_type = Some(backup_type);
        self
    }

    /// Set the page size.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Set the page offset.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// One page of backup records plus the total match count.
#[derive(Debug, Clone)]
pub struct BackupPage {
    /// Records in creation-time-descending order
    pub records: Vec<BackupRecord>,
    /// Total records matching the filter, ignoring pagination
    pub total: usize,
}

/// Filter and pagination for listing restore records.
#[derive(Debug, Clone)]
pub struct RestoreListQuery {
    /// Only restores of this backup
    pub backup_id: Option<String>,
    /// Exact-match status filter
    pub status: Option<RestoreStatus>,
    /// Page size
    pub limit: usize,
    /// Offset into the creation-time-descending ordering
    pub offset: usize,
}

impl Default for RestoreListQuery {
    fn default() -> Self {
        Self {
            backup_id: None,
            status: None,
            limit: 50,
            offset: 0,
        }
    }
}
