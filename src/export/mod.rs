//! The backup exporter: snapshots the configured table set into a single
//! envelope blob and drives the backup record to a terminal state.

mod envelope;
mod exporter;

pub use envelope::{checksum_hex, BackupEnvelope, ENVELOPE_VERSION};
pub use exporter::BackupExporter;

use thiserror::Error;

/// Errors raised by export processing
#[derive(Error, Debug)]
pub enum ExportError {
    /// Catalog record failure
    #[error("Catalog error: {0}")]
    Catalog(#[from] crate::catalog::CatalogError),

    /// Store failure outside per-table soft-fail handling
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// Envelope serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Gzip failure
    #[error("Compression error: {0}")]
    Compression(String),
}
