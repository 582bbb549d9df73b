//! Static table-set policy: which tables a backup type covers.
//!
//! The mapping is configuration, not schema introspection. A new platform
//! table must be added here by the operator before backups cover it.

use crate::catalog::BackupType;

/// Core content tables captured by selective (and incremental) backups.
pub const CORE_TABLES: &[&str] = &[
    "posts",
    "pages",
    "users",
    "media",
    "categories",
    "tags",
    "settings",
];

/// Tables captured only by full backups, in addition to [`CORE_TABLES`].
pub const EXTENDED_TABLES: &[&str] = &[
    "comments",
    "revisions",
    "subscribers",
    "navigation_menus",
    "analytics_events",
    "audit_log",
];

/// Maps a backup type to the tables it covers.
///
/// The full set is always a strict superset of the core set. An explicit
/// table list supplied by the caller wins over both.
#[derive(Debug, Clone)]
pub struct TableSetPolicy {
    core: Vec<String>,
    all: Vec<String>,
}

impl TableSetPolicy {
    /// Policy from a core set plus extra tables only full backups capture.
    pub fn new(core: Vec<String>, extended: Vec<String>) -> Self {
        let mut all = core.clone();
        for table in extended {
            if !all.contains(&table) {
                all.push(table);
            }
        }
        debug_assert!(all.len() > core.len(), "full set must be a strict superset");
        Self { core, all }
    }

    /// The platform's default mapping.
    pub fn publishing_defaults() -> Self {
        Self::new(
            CORE_TABLES.iter().map(|t| t.to_string()).collect(),
            EXTENDED_TABLES.iter().map(|t| t.to_string()).collect(),
        )
    }

    /// Resolve the table set for a backup.
    ///
    /// An explicit list always wins; otherwise `Full` maps to all tables and
    /// every other type to the core tables.
    pub fn resolve(&self, backup_type: BackupType, explicit: Option<Vec<String>>) -> Vec<String> {
        if let Some(tables) = explicit {
            return tables;
        }
        match backup_type {
            BackupType::Full => self.all.clone(),
            BackupType::Incremental | BackupType::Selective => self.core.clone(),
        }
    }

    /// Core table names.
    pub fn core_tables(&self) -> &[String] {
        &self.core
    }

    /// All table names, core included.
    pub fn all_tables(&self) -> &[String] {
        &self.all
    }
}

impl Default for TableSetPolicy {
    fn default() -> Self {
        Self::publishing_defaults()
    }
}
