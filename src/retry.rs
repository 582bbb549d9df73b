//! Retry with exponential backoff and jitter for transient store failures.
//!
//! Only background jobs (export, restore) retry; catalog CRUD surfaces store
//! errors directly to the caller.

use crate::store::StoreError;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    pub max_attempts: usize,
    /// Initial delay between attempts
    pub initial_delay: Duration,
    /// Maximum delay between attempts
    pub max_delay: Duration,
    /// Backoff multiplier
    pub backoff_multiplier: f64,
    /// Add jitter to prevent thundering herd
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no backoff. Useful in tests.
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Execute `operation` under `config`, bounding each attempt by `op_timeout`.
///
/// Returns the first success, or the error from the final attempt. A timed
/// out attempt counts as a failed attempt.
pub async fn retry_with_backoff<F, Fut, T>(
    config: &RetryConfig,
    op_timeout: Duration,
    label: &str,
    operation: F,
) -> Result<T, StoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        let outcome = match tokio::time::timeout(op_timeout, operation()).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Backend(format!(
                "{} timed out after {:?}",
                label, op_timeout
            ))),
        };

        match outcome {
            Ok(result) => {
                if attempt > 1 {
                    info!(operation = label, attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => {
                if attempt >= config.max_attempts {
                    return Err(error);
                }

                warn!(
                    operation = label,
                    attempt = attempt,
                    error = %error,
                    retry_in = ?delay,
                    "Attempt failed, retrying"
                );

                let actual_delay = if config.jitter {
                    let jitter_ms = (delay.as_millis() as f64 * rand::random::<f64>() * 0.1) as u64;
                    delay + Duration::from_millis(jitter_ms)
                } else {
                    delay
                };

                tokio::time::sleep(actual_delay).await;

                delay = Duration::from_millis(
                    (delay.as_millis() as f64 * config.backoff_multiplier) as u64,
                )
                .min(config.max_delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let attempts = AtomicUsize::new(0);
        let config = RetryConfig {
            initial_delay: Duration::from_millis(1),
            jitter: false,
            ..RetryConfig::default()
        };

        let result = retry_with_backoff(&config, Duration::from_secs(1), "test", || async {
            if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StoreError::Backend("transient".into()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_when_exhausted() {
        let config = RetryConfig {
            max_attempts: 2,
            initial_delay: Duration::from_millis(1),
            jitter: false,
            ..RetryConfig::default()
        };

        let result: Result<(), _> =
            retry_with_backoff(&config, Duration::from_secs(1), "test", || async {
                Err(StoreError::Backend("still down".into()))
            })
            .await;

        assert!(matches!(result, Err(StoreError::Backend(_))));
    }
}
