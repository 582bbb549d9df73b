//! Background job dispatch with trackable handles.
//!
//! Export and restore are fire-and-forget relative to the call that creates
//! their record, but the spawned task is not anonymous: its handle is kept
//! here so completion can be awaited and a runaway job aborted.

use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Registry of in-flight background jobs keyed by record id.
#[derive(Clone, Default)]
pub struct JobTracker {
    handles: Arc<DashMap<String, JoinHandle<()>>>,
}

impl JobTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `job` and track its handle under `id`.
    pub fn dispatch<F>(&self, id: &str, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(job);
        if let Some(previous) = self.handles.insert(id.to_string(), handle) {
            // A finished handle for the same id is expected; an unfinished
            // one would mean a double dispatch, which the status CAS in the
            // processor turns into a no-op anyway.
            if !previous.is_finished() {
                debug!(job_id = %id, "Replaced an unfinished job handle");
            }
        }
    }

    /// Wait for the job dispatched under `id`, if any. Returns whether the
    /// task ran to completion without panicking.
    pub async fn wait(&self, id: &str) -> bool {
        match self.handles.remove(id) {
            Some((_, handle)) => handle.await.is_ok(),
            None => false,
        }
    }

    /// Abort the job dispatched under `id`. Returns whether a handle was
    /// found.
    pub fn abort(&self, id: &str) -> bool {
        match self.handles.remove(id) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Number of jobs still running.
    pub fn active(&self) -> usize {
        self.handles
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }

    /// Wait for every tracked job to finish.
    pub async fn wait_all(&self) {
        let ids: Vec<String> = self.handles.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.wait(&id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn wait_observes_completion() {
        let tracker = JobTracker::new();
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();

        tracker.dispatch("job-1", async move {
            flag.store(true, Ordering::SeqCst);
        });

        assert!(tracker.wait("job-1").await);
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn abort_stops_a_running_job() {
        let tracker = JobTracker::new();
        tracker.dispatch("job-2", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        assert!(tracker.abort("job-2"));
        assert!(!tracker.wait("job-2").await);
    }

    #[tokio::test]
    async fn wait_on_unknown_id_is_false() {
        let tracker = JobTracker::new();
        assert!(!tracker.wait("missing").await);
    }
}
