//! High-level facade tying the job core together.
//!
//! [`FetchService`] owns the store, runner, notifier, and retention manager,
//! and is the only type the API layer (or an embedding application) talks to.
//! It is cheap to clone and safe to share across tasks.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::MediaExtractor;
use crate::fsutil;
use crate::notify::Notifier;
use crate::retention::RetentionManager;
use crate::runner::JobRunner;
use crate::store::JobStore;
use crate::types::{Artifact, DirectUrlInfo, JobId, JobSnapshot, JobStatus, Metadata};
use futures::StreamExt;
use futures::stream::Stream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;

/// Facade over the download job core
///
/// Construction resolves and prepares the storage area and sweeps files left
/// behind by earlier runs. All methods are safe to call concurrently.
#[derive(Clone)]
pub struct FetchService {
    config: Config,
    store: JobStore,
    runner: JobRunner,
    notifier: Notifier,
    retention: RetentionManager,
    extractor: Arc<dyn MediaExtractor>,
    storage_dir: PathBuf,
    shutting_down: Arc<AtomicBool>,
}

impl FetchService {
    /// Build the service with the given extractor
    pub async fn new(config: Config, extractor: Arc<dyn MediaExtractor>) -> Result<Self> {
        let storage_dir = fsutil::resolve_storage_dir(
            config.storage.dir.as_deref(),
            fsutil::detect_serverless(),
        );
        fsutil::ensure_dir(&storage_dir).await?;
        tracing::info!(dir = %storage_dir.display(), "Storage directory ready");

        crate::retention::sweep_stale(&storage_dir, config.retention.stale_max_age).await;

        let store = JobStore::new();
        let runner = JobRunner::new(
            store.clone(),
            extractor.clone(),
            config.retry.clone(),
            storage_dir.clone(),
        );
        let notifier = Notifier::new(store.clone(), config.notify.poll_interval);
        let retention = RetentionManager::new(store.clone(), config.retention.clone());

        Ok(Self {
            config,
            store,
            runner,
            notifier,
            retention,
            extractor,
            storage_dir,
            shutting_down: Arc::new(AtomicBool::new(false)),
        })
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Directory artifacts are written into
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Fetch video metadata without downloading
    pub async fn fetch_metadata(&self, url: &str) -> Result<Metadata> {
        validate_url(url)?;
        self.extractor.fetch_metadata(url).await
    }

    /// Resolve a direct source URL without downloading
    pub async fn fetch_direct_url(&self, url: &str) -> Result<DirectUrlInfo> {
        validate_url(url)?;
        self.extractor.fetch_direct_url(url).await
    }

    /// Accept a new download job and return its id
    ///
    /// Rejected with [`Error::ShuttingDown`] once shutdown has begun. Every
    /// accepted job gets a grace-delayed cleanup armed for when it finishes,
    /// so artifacts that are never fetched do not pile up.
    pub async fn start_download(&self, url: &str) -> Result<JobId> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }
        let id = self.runner.start(url).await?;

        let notifier = self.notifier.clone();
        let retention = self.retention.clone();
        let watch_id = id.clone();
        tokio::spawn(async move {
            // The watch stream ends at the terminal snapshot
            let mut updates = std::pin::pin!(notifier.watch(watch_id.clone()));
            while updates.next().await.is_some() {}
            retention.schedule_unfetched(watch_id);
        });

        Ok(id)
    }

    /// One snapshot of a job, or `None` for an unknown id
    pub async fn snapshot(&self, id: &JobId) -> Option<JobSnapshot> {
        self.notifier.snapshot(id).await
    }

    /// Stream of job snapshots until the job reaches a terminal state
    pub fn watch(&self, id: JobId) -> impl Stream<Item = JobSnapshot> + Send + use<> {
        self.notifier.watch(id)
    }

    /// Locate a completed job's artifact for serving
    ///
    /// Errors distinguish the three ways this fails: the job id is unknown,
    /// the job has not completed, or the artifact file is gone from storage.
    pub async fn artifact_for_serving(&self, id: &JobId) -> Result<Artifact> {
        let job = self
            .store
            .get(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("download {id}")))?;

        if job.status != JobStatus::Completed {
            return Err(Error::Validation(format!(
                "download {id} is not complete (status: {:?})",
                job.status
            )));
        }

        let artifact = job
            .artifact
            .ok_or_else(|| Error::NotFound(format!("file for download {id}")))?;
        if !tokio::fs::try_exists(&artifact.path).await.unwrap_or(false) {
            return Err(Error::NotFound(format!("file for download {id}")));
        }
        Ok(artifact)
    }

    /// Schedule deferred cleanup for a job whose artifact has been served
    pub fn schedule_cleanup(&self, id: JobId) -> JoinHandle<()> {
        self.retention.schedule_cleanup(id)
    }

    /// Stop accepting new downloads and wait for in-flight jobs to finish
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let in_flight = self.runner.in_flight().await;
        if in_flight > 0 {
            tracing::info!(in_flight, "Waiting for in-flight downloads");
        }
        self.runner.wait_all().await;
        tracing::info!("Shutdown complete");
    }
}

fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|_| Error::Validation(format!("'{url}' is not a valid URL")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::Validation(format!(
            "unsupported URL scheme '{}'",
            parsed.scheme()
        )));
    }
    Ok(())
}
