//! Retention: delayed cleanup of served artifacts and sweeping of stale
//! files left behind by earlier runs.
//!
//! All deletion failures are logged and swallowed; retention is best-effort
//! and never affects job outcomes or request handling.

use crate::config::RetentionConfig;
use crate::store::JobStore;
use crate::types::JobId;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Schedules artifact and record cleanup after a download has been served
#[derive(Clone)]
pub struct RetentionManager {
    store: JobStore,
    config: RetentionConfig,
}

impl RetentionManager {
    /// Create a retention manager over the shared store
    pub fn new(store: JobStore, config: RetentionConfig) -> Self {
        Self { store, config }
    }

    /// Schedule cleanup for a job whose artifact has been served
    ///
    /// After `artifact_delay` the artifact file is deleted (so the client's
    /// transfer can finish first), and after a further `record_delay` the job
    /// record is dropped. Both steps are idempotent; scheduling twice for the
    /// same job is harmless.
    pub fn schedule_cleanup(&self, id: JobId) -> JoinHandle<()> {
        let store = self.store.clone();
        let artifact_delay = self.config.artifact_delay;
        let record_delay = self.config.record_delay;

        tokio::spawn(async move {
            tokio::time::sleep(artifact_delay).await;

            if let Some(job) = store.get(&id).await {
                if let Some(artifact) = job.artifact {
                    match tokio::fs::remove_file(&artifact.path).await {
                        Ok(()) => {
                            tracing::debug!(job = %id, file = %artifact.name, "Deleted artifact")
                        }
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => {
                            tracing::warn!(
                                job = %id,
                                path = %artifact.path.display(),
                                error = %e,
                                "Failed to delete artifact"
                            );
                        }
                    }
                }
            }

            tokio::time::sleep(record_delay).await;
            if store.remove(&id).await {
                tracing::debug!(job = %id, "Dropped job record");
            }
        })
    }

    /// Schedule cleanup for a finished job that may never be fetched
    ///
    /// After `unfetched_grace` whatever is left of the job is removed: the
    /// artifact file if still on disk, then the record. A fetch-triggered
    /// [`schedule_cleanup`](Self::schedule_cleanup) that already ran makes
    /// this a no-op.
    pub fn schedule_unfetched(&self, id: JobId) -> JoinHandle<()> {
        let store = self.store.clone();
        let grace = self.config.unfetched_grace;

        tokio::spawn(async move {
            tokio::time::sleep(grace).await;

            let Some(job) = store.get(&id).await else {
                return;
            };
            if let Some(artifact) = job.artifact {
                match tokio::fs::remove_file(&artifact.path).await {
                    Ok(()) => {
                        tracing::debug!(job = %id, file = %artifact.name, "Deleted unfetched artifact")
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        tracing::warn!(
                            job = %id,
                            path = %artifact.path.display(),
                            error = %e,
                            "Failed to delete unfetched artifact"
                        );
                    }
                }
            }
            if store.remove(&id).await {
                tracing::debug!(job = %id, "Dropped unfetched job record");
            }
        })
    }
}

/// Delete files in `dir` whose modification time is older than `max_age`
///
/// Run at startup to reclaim space from downloads orphaned by a previous
/// process. Unreadable entries and failed deletions are logged and skipped.
pub async fn sweep_stale(dir: &Path, max_age: Duration) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(dir = %dir.display(), error = %e, "Stale sweep could not read directory");
            return;
        }
    };

    let mut removed = 0usize;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let stale = metadata
            .modified()
            .ok()
            .and_then(|mtime| mtime.elapsed().ok())
            .is_some_and(|age| age > max_age);
        if !stale {
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                removed += 1;
                tracing::debug!(path = %path.display(), "Removed stale file");
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to remove stale file");
            }
        }
    }

    if removed > 0 {
        tracing::info!(dir = %dir.display(), removed, "Stale sweep finished");
    }
}
