//! Notification channel: per-job snapshot streams for subscribers.
//!
//! The stream is pull-based: each element is produced only when the consumer
//! polls, so dropping a subscriber (a client disconnecting mid-stream) stops
//! all polling work for that subscription with no orphaned task left behind.
//! One final snapshot carrying the terminal state is always emitted before
//! the stream ends.

use crate::store::JobStore;
use crate::types::{JobId, JobSnapshot};
use futures::stream::Stream;
use std::time::Duration;

/// Produces point-in-time snapshots and bounded snapshot streams
#[derive(Clone)]
pub struct Notifier {
    store: JobStore,
    poll_interval: Duration,
}

#[derive(Clone, Copy)]
enum WatchState {
    Start,
    Polling,
    Done,
}

impl Notifier {
    /// Create a notifier polling the store at `poll_interval`
    pub fn new(store: JobStore, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
        }
    }

    /// One snapshot of a job, or `None` for an unknown id
    pub async fn snapshot(&self, id: &JobId) -> Option<JobSnapshot> {
        self.store.get(id).await.as_ref().map(JobSnapshot::from)
    }

    /// Stream of snapshots until the job reaches a terminal state
    ///
    /// Emits the current snapshot immediately, then one per poll interval.
    /// The snapshot carrying the terminal state is the last element. An
    /// unknown id yields exactly one error-shaped snapshot.
    pub fn watch(&self, id: JobId) -> impl Stream<Item = JobSnapshot> + Send + use<> {
        let store = self.store.clone();
        let interval = self.poll_interval;

        futures::stream::unfold(WatchState::Start, move |state| {
            let store = store.clone();
            let id = id.clone();
            async move {
                match state {
                    WatchState::Done => None,
                    WatchState::Start | WatchState::Polling => {
                        if matches!(state, WatchState::Polling) {
                            tokio::time::sleep(interval).await;
                        }
                        match store.get(&id).await {
                            None => {
                                // Unknown or already-removed job: one error
                                // snapshot, then end
                                Some((JobSnapshot::unknown(), WatchState::Done))
                            }
                            Some(job) => {
                                let snapshot = JobSnapshot::from(&job);
                                let next = if job.status.is_terminal() {
                                    WatchState::Done
                                } else {
                                    WatchState::Polling
                                };
                                Some((snapshot, next))
                            }
                        }
                    }
                }
            }
        })
    }
}
