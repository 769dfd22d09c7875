//! Progress reporting: normalizes raw extractor samples into clamped,
//! monotone percentage updates on the job store.
//!
//! Progress is best-effort telemetry. Malformed, out-of-range, or regressing
//! samples are dropped rather than failing the job; the strict drop policy is
//! deliberate so subscribers never see invented or backwards values.

use crate::store::JobStore;
use crate::types::{JobId, JobStatus, RawProgress};
use async_trait::async_trait;

/// Sink for raw progress events, bound to one job
///
/// The extractor reports through this seam so the progress path is testable
/// without invoking a real download.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Accept one raw progress sample
    async fn report(&self, raw: RawProgress);
}

/// Store-backed progress reporter
///
/// Writes normalized percentages for a single job; mutates only the
/// `progress` field and only while the job is pending or running.
pub struct StoreProgress {
    store: JobStore,
    id: JobId,
}

impl StoreProgress {
    /// Bind a reporter to a job
    pub fn new(store: JobStore, id: JobId) -> Self {
        Self { store, id }
    }
}

#[async_trait]
impl ProgressSink for StoreProgress {
    async fn report(&self, raw: RawProgress) {
        let Some(percent) = normalize(&raw) else {
            return;
        };
        self.store
            .update(&self.id, |job| {
                // Monotone while running; stale or duplicate samples drop out here
                if matches!(job.status, JobStatus::Pending | JobStatus::Running)
                    && percent > job.progress
                {
                    job.progress = percent;
                }
            })
            .await;
    }
}

/// Compute a normalized percentage from a raw sample
///
/// Returns `None` for samples that cannot be trusted: missing totals,
/// unparseable percent strings, non-finite values, or values outside
/// [0, 100]. Valid values are rounded to one decimal place.
pub(crate) fn normalize(raw: &RawProgress) -> Option<f32> {
    let percent = match raw {
        RawProgress::Bytes {
            downloaded,
            total: Some(total),
        } if *total > 0 => (*downloaded as f64 / *total as f64) * 100.0,
        RawProgress::Bytes { .. } => return None,
        RawProgress::Percent(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok()?,
    };

    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return None;
    }
    Some(((percent * 10.0).round() / 10.0) as f32)
}
