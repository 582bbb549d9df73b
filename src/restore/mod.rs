//! The restore engine: replays a backup envelope into the live tables.
//!
//! Each table is snapshotted before it is touched. An insert failure
//! reverts the table and rolls back every table already replaced in the
//! same run, so a failed restore never leaves tables half-replaced.

mod engine;

pub use engine::RestoreEngine;

use crate::catalog::BackupStatus;
use thiserror::Error;

/// Errors raised by restore creation and processing
#[derive(Error, Debug)]
pub enum RestoreError {
    /// The referenced backup does not exist
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    /// The referenced backup is not in a restorable state
    #[error("Backup {id} is not restorable from status {status:?}")]
    BackupNotRestorable {
        /// Backup record id
        id: String,
        /// Status observed at creation time
        status: BackupStatus,
    },

    /// A completed backup record without a stored envelope path
    #[error("Backup {0} has no stored envelope")]
    MissingEnvelope(String),

    /// Downloaded envelope bytes do not match the recorded checksum
    #[error("Envelope checksum mismatch for backup {0}")]
    ChecksumMismatch(String),

    /// Catalog record failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    /// Store failure
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// Envelope parse failure
    #[error("Envelope error: {0}")]
    Envelope(#[from] crate::export::ExportError),
}
