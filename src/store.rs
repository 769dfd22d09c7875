//! Job store: concurrency-safe mapping from job id to job state.
//!
//! The store is the single shared mutable resource of the job core. All
//! mutation goes through [`JobStore::update`], which is safe under concurrent
//! writers and enforces terminal-state immutability.

use crate::types::{Job, JobId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Concurrency-safe registry of download jobs
///
/// Cheap to clone; clones share the same underlying map.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl JobStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh pending job and return its id
    ///
    /// Ids are 128-bit random tokens; the store still regenerates on the
    /// (vanishingly unlikely) collision so no two calls ever return the same
    /// id within a process.
    pub async fn create(&self) -> JobId {
        let mut jobs = self.jobs.write().await;
        let mut id = JobId::generate();
        while jobs.contains_key(&id) {
            id = JobId::generate();
        }
        jobs.insert(id.clone(), Job::new(id.clone()));
        id
    }

    /// Get a point-in-time copy of a job
    pub async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Apply a mutation to a job under the write lock
    ///
    /// Returns `false` without applying the mutation when the id is unknown
    /// or the job is already in a terminal state. Callers treating a missing
    /// id as an error must check the return value; cleanup paths deliberately
    /// ignore it.
    pub async fn update(&self, id: &JobId, mutate: impl FnOnce(&mut Job)) -> bool {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(id) {
            Some(job) if !job.status.is_terminal() => {
                mutate(job);
                true
            }
            _ => false,
        }
    }

    /// Remove a job record; returns `false` if it was already gone
    pub async fn remove(&self, id: &JobId) -> bool {
        self.jobs.write().await.remove(id).is_some()
    }

    /// Number of tracked jobs
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether the store tracks no jobs
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
