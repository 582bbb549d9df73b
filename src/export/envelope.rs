//! The backup envelope wire format.
//!
//! Field names are load-bearing: existing stored backups must remain
//! loadable, so `version`, `created_at`, `tables`, and `data` are preserved
//! byte-for-byte.

use crate::export::ExportError;
use crate::store::Row;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::{Read, Write};

/// Current envelope format version.
pub const ENVELOPE_VERSION: &str = "1.0";

/// Gzip magic bytes; used to sniff compressed envelopes on download.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// The single serialized blob containing all exported table rows for one
/// backup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEnvelope {
    /// Format version, currently "1.0"
    pub version: String,
    /// ISO-8601 creation timestamp
    pub created_at: String,
    /// Tables actually captured (not necessarily all tables requested)
    pub tables: Vec<String>,
    /// Captured rows, keyed by table name
    pub data: BTreeMap<String, Vec<Row>>,
}

impl BackupEnvelope {
    /// Create an empty envelope stamped with `created_at`.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            version: ENVELOPE_VERSION.to_string(),
            created_at: created_at.to_rfc3339(),
            tables: Vec::new(),
            data: BTreeMap::new(),
        }
    }

    /// Record a captured table and its rows.
    pub fn add_table(&mut self, table: &str, rows: Vec<Row>) {
        self.tables.push(table.to_string());
        self.data.insert(table.to_string(), rows);
    }

    /// Rows captured for `table`, if present.
    pub fn rows_for(&self, table: &str) -> Option<&Vec<Row>> {
        self.data.get(table)
    }

    /// Total captured rows across all tables.
    pub fn total_rows(&self) -> usize {
        self.data.values().map(|rows| rows.len()).sum()
    }

    /// Serialize to the JSON wire form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ExportError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse an envelope from downloaded bytes, transparently handling a
    /// gzip-compressed payload.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ExportError> {
        if bytes.starts_with(&GZIP_MAGIC) {
            let mut decoder = GzDecoder::new(bytes);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| ExportError::Compression(format!("Failed to decompress envelope: {}", e)))?;
            Ok(serde_json::from_slice(&decompressed)?)
        } else {
            Ok(serde_json::from_slice(bytes)?)
        }
    }

    /// Gzip the serialized envelope at the given level.
    pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>, ExportError> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level.min(9)));
        encoder
            .write_all(data)
            .map_err(|e| ExportError::Compression(format!("Failed to compress envelope: {}", e)))?;
        encoder
            .finish()
            .map_err(|e| ExportError::Compression(format!("Failed to finalize compression: {}", e)))
    }
}

/// Hex-encoded SHA-256 of the given bytes.
pub fn checksum_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(id: u64) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(id));
        row.insert("title".to_string(), json!(format!("post {}", id)));
        row
    }

    #[test]
    fn wire_field_names_are_preserved() {
        let mut envelope = BackupEnvelope::new(Utc::now());
        envelope.add_table("posts", vec![row(1)]);

        let value: serde_json::Value =
            serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();

        assert_eq!(value["version"], json!("1.0"));
        assert!(value["created_at"].is_string());
        assert_eq!(value["tables"], json!(["posts"]));
        assert_eq!(value["data"]["posts"][0]["id"], json!(1));
    }

    #[test]
    fn compressed_envelope_round_trips_via_sniffing() {
        let mut envelope = BackupEnvelope::new(Utc::now());
        envelope.add_table("pages", (0..20).map(row).collect());

        let plain = envelope.to_bytes().unwrap();
        let compressed = BackupEnvelope::compress(&plain, 6).unwrap();
        assert!(compressed.starts_with(&[0x1f, 0x8b]));

        let parsed = BackupEnvelope::from_bytes(&compressed).unwrap();
        assert_eq!(parsed.total_rows(), 20);
        assert_eq!(parsed.tables, vec!["pages".to_string()]);
    }

    #[test]
    fn checksum_is_stable_hex() {
        let a = checksum_hex(b"envelope");
        let b = checksum_hex(b"envelope");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
