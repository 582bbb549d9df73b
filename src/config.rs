//! Runtime configuration for export, restore, and retention jobs.
//!
//! Defaults match the platform's long-standing operational values: 100,000
//! row read cap, 100-row insert batches, 30-day retention.

use crate::retry::RetryConfig;
use std::time::Duration;

/// Configuration shared by the exporter, restore engine, and sweeper.
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Maximum rows read per table during export; reads at the cap are
    /// recorded as truncated on the backup record.
    pub row_cap: usize,
    /// Rows per insert batch during restore. Batches bound request size
    /// only; they are independent units of failure.
    pub insert_batch_size: usize,
    /// Retention window applied when a create request does not specify one.
    pub default_retention_days: u32,
    /// Timeout applied to each individual store or object-store call made
    /// from a background job.
    pub op_timeout: Duration,
    /// Retry policy for transient store and object-store failures.
    pub retry: RetryConfig,
    /// Gzip the envelope before upload. Off by default so stored envelopes
    /// remain plain JSON.
    pub compression: bool,
    /// Gzip level when compression is enabled (0-9).
    pub compression_level: u32,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            row_cap: 100_000,
            insert_batch_size: 100,
            default_retention_days: 30,
            op_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            compression: false,
            compression_level: 6,
        }
    }
}

impl VaultConfig {
    /// Create a configuration with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-table row read cap.
    pub fn with_row_cap(mut self, cap: usize) -> Self {
        self.row_cap = cap.max(1);
        self
    }

    /// Set the restore insert batch size.
    pub fn with_insert_batch_size(mut self, size: usize) -> Self {
        self.insert_batch_size = size.max(1);
        self
    }

    /// Set the default retention window in days.
    pub fn with_default_retention_days(mut self, days: u32) -> Self {
        self.default_retention_days = days;
        self
    }

    /// Set the per-call timeout for store operations inside jobs.
    pub fn with_op_timeout(mut self, timeout: Duration) -> Self {
        self.op_timeout = timeout;
        self
    }

    /// Set the retry policy for transient failures.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Enable or disable envelope compression.
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compression = enabled;
        self
    }

    /// Set the gzip level used when compression is enabled.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        self.compression_level = level.min(9);
        self
    }
}
