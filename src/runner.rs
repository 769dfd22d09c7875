//! Job runner: owns job execution from acceptance to terminal state.
//!
//! `start` validates the URL, registers a pending job, and spawns the
//! download onto the runtime; the spawned task drives the status transitions
//! `pending -> running -> {completed, failed}` and never panics the server.
//! Every job reaches a terminal state even when the extractor misbehaves.

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::extract::MediaExtractor;
use crate::fsutil;
use crate::policy::PlatformPolicy;
use crate::progress::{ProgressSink, StoreProgress};
use crate::store::JobStore;
use crate::types::{Artifact, JobId, JobStatus, LocalFile};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Spawns and tracks download jobs
///
/// Cheap to clone; clones share the store and the task registry.
#[derive(Clone)]
pub struct JobRunner {
    store: JobStore,
    extractor: Arc<dyn MediaExtractor>,
    retry: RetryConfig,
    storage_dir: PathBuf,
    tasks: Arc<Mutex<HashMap<JobId, JoinHandle<()>>>>,
}

impl JobRunner {
    /// Create a runner writing artifacts into `storage_dir`
    pub fn new(
        store: JobStore,
        extractor: Arc<dyn MediaExtractor>,
        retry: RetryConfig,
        storage_dir: PathBuf,
    ) -> Self {
        Self {
            store,
            extractor,
            retry,
            storage_dir,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Validate the URL, register a job, and spawn its download
    ///
    /// Returns the job id immediately; all further outcomes are observable
    /// through the store. Invalid URLs are rejected here, before any job
    /// record exists.
    pub async fn start(&self, url: &str) -> Result<JobId> {
        let parsed = url::Url::parse(url)
            .map_err(|_| Error::Validation(format!("'{url}' is not a valid URL")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Validation(format!(
                "unsupported URL scheme '{}'",
                parsed.scheme()
            )));
        }

        let id = self.store.create().await;
        tracing::info!(job = %id, url, "Accepted download job");

        let runner = self.clone();
        let job_id = id.clone();
        let job_url = url.to_string();
        // Hold the registry lock across the spawn: the task's self-removal
        // below must not run before its handle has been inserted
        let mut tasks = self.tasks.lock().await;
        let handle = tokio::spawn(async move {
            runner.run_job(job_id.clone(), job_url).await;
            runner.tasks.lock().await.remove(&job_id);
        });
        tasks.insert(id.clone(), handle);
        drop(tasks);

        Ok(id)
    }

    /// Wait for a job's task to finish, if it is still tracked
    ///
    /// Used by shutdown and tests; ordinary clients observe jobs through the
    /// notification channel instead.
    pub async fn wait(&self, id: &JobId) {
        let handle = self.tasks.lock().await.remove(id);
        if let Some(handle) = handle {
            handle.await.ok();
        }
    }

    /// Wait for all in-flight jobs to finish
    pub async fn wait_all(&self) {
        let handles: Vec<_> = {
            let mut tasks = self.tasks.lock().await;
            tasks.drain().map(|(_, h)| h).collect()
        };
        for handle in handles {
            handle.await.ok();
        }
    }

    /// Number of jobs currently in flight
    pub async fn in_flight(&self) -> usize {
        self.tasks.lock().await.len()
    }

    async fn run_job(&self, id: JobId, url: String) {
        self.store
            .update(&id, |job| job.status = JobStatus::Running)
            .await;

        let policy = PlatformPolicy::for_url(&url);
        tracing::info!(job = %id, policy = policy.name(), "Starting download");
        let options = policy.fetch_options();

        let sink: Arc<dyn ProgressSink> =
            Arc::new(StoreProgress::new(self.store.clone(), id.clone()));

        let result = crate::retry::retry_with_backoff(&self.retry, || {
            self.extractor
                .download(&url, &options, &self.storage_dir, sink.clone())
        })
        .await;

        let outcome = match result {
            Ok(local) => self.finalize(local).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(artifact) => {
                tracing::info!(job = %id, file = %artifact.name, "Download completed");
                self.store
                    .update(&id, |job| {
                        job.status = JobStatus::Completed;
                        job.progress = 100.0;
                        job.artifact = Some(artifact);
                    })
                    .await;
            }
            Err(e) => {
                tracing::error!(job = %id, error = %e, "Download failed");
                self.store
                    .update(&id, |job| {
                        job.status = JobStatus::Failed;
                        job.error = Some(e.to_string());
                    })
                    .await;
            }
        }
    }

    /// Move the extractor's output to its sanitized, collision-free name
    async fn finalize(&self, local: LocalFile) -> Result<Artifact> {
        let sanitized = fsutil::sanitize_filename(&local.name);
        let target = self.storage_dir.join(&sanitized);

        if target == local.path {
            return Ok(Artifact {
                name: sanitized,
                path: target,
            });
        }

        let target = fsutil::unique_path(&target)?;
        tokio::fs::rename(&local.path, &target).await.map_err(|e| {
            Error::Storage(format!(
                "failed to move '{}' into place: {}",
                local.path.display(),
                e
            ))
        })?;

        let name = target
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&sanitized)
            .to_string();
        Ok(Artifact { name, path: target })
    }
}
