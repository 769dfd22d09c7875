//! Core types: job identifiers, job records, wire snapshots, and the data
//! structures exchanged with the media extractor.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Unique identifier for a download job
///
/// An opaque 128-bit random token rendered as 32 lowercase hex characters.
/// Collision-resistant for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a fresh random job id
    pub fn generate() -> Self {
        let token: u128 = rand::random();
        Self(format!("{token:032x}"))
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Download job status
///
/// The only legal transitions are `pending -> running -> {completed, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, execution not yet begun
    Pending,
    /// Extraction in flight
    Running,
    /// Artifact produced; terminal
    Completed,
    /// Download failed; terminal
    Failed,
}

impl JobStatus {
    /// Whether this status admits no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// The produced media file
///
/// `path` is a non-owning reference into the storage area: removing the job
/// record does not delete the file, and vice versa.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Display name served to clients
    pub name: String,
    /// Location on storage
    pub path: PathBuf,
}

/// One tracked asynchronous download attempt
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique token identifying this job
    pub id: JobId,
    /// Current lifecycle state
    pub status: JobStatus,
    /// Percentage in [0, 100], non-decreasing while running
    pub progress: f32,
    /// Populated iff status is `Completed`
    pub artifact: Option<Artifact>,
    /// Populated iff status is `Failed`
    pub error: Option<String>,
}

impl Job {
    /// Create a fresh pending job
    pub fn new(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0.0,
            artifact: None,
            error: None,
        }
    }
}

/// Status field of a wire snapshot
///
/// Extends [`JobStatus`] with an `error` value used for snapshots of unknown
/// job ids, where no job record exists to report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    /// Job accepted, not yet running
    Pending,
    /// Job in flight
    Running,
    /// Job finished successfully
    Completed,
    /// Job finished with an error
    Failed,
    /// No such job
    Error,
}

impl From<JobStatus> for SnapshotStatus {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Pending => SnapshotStatus::Pending,
            JobStatus::Running => SnapshotStatus::Running,
            JobStatus::Completed => SnapshotStatus::Completed,
            JobStatus::Failed => SnapshotStatus::Failed,
        }
    }
}

/// Point-in-time view of a job as emitted on the notification channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobSnapshot {
    /// Lifecycle state at snapshot time
    pub status: SnapshotStatus,
    /// Progress percentage in [0, 100]
    pub progress: f32,
    /// Artifact display name, present once completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Failure description, present once failed (or for unknown ids)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobSnapshot {
    /// Snapshot emitted for a job id the store does not know
    pub fn unknown() -> Self {
        Self {
            status: SnapshotStatus::Error,
            progress: 0.0,
            filename: None,
            error: Some("invalid download id".to_string()),
        }
    }
}

impl From<&Job> for JobSnapshot {
    fn from(job: &Job) -> Self {
        Self {
            status: job.status.into(),
            progress: job.progress,
            filename: job.artifact.as_ref().map(|a| a.name.clone()),
            error: job.error.clone(),
        }
    }
}

/// Video metadata returned without downloading
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Metadata {
    /// Video title
    pub title: String,
    /// Thumbnail URL
    pub thumbnail: String,
    /// Duration in seconds
    pub duration: u64,
    /// Uploader / channel name
    pub uploader: String,
    /// The URL the metadata was fetched for
    pub url: String,
    /// Platform family reported by the extractor
    pub platform: String,
}

/// Direct source URL information (zero local storage path)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectUrlInfo {
    /// URL the client can fetch the media from directly
    pub direct_url: String,
    /// Suggested filename
    pub filename: String,
    /// Size in bytes when the source reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,
    /// Seconds the direct URL is expected to remain valid
    pub expires_in: u64,
}

/// A file the extractor wrote into the storage area
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Filename as written by the extractor (not yet sanitized)
    pub name: String,
    /// Full path of the written file
    pub path: PathBuf,
}

/// A raw progress sample as reported by the extractor
///
/// Samples are best-effort telemetry; malformed ones are dropped, never
/// failing the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawProgress {
    /// Byte counters, with the total unknown for some sources
    Bytes {
        /// Bytes downloaded so far
        downloaded: u64,
        /// Total expected bytes, when known
        total: Option<u64>,
    },
    /// A percent-formatted string such as ` 45.3%`
    Percent(String),
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn job_ids_are_unique_and_hex() {
        let mut seen = HashSet::new();
        for _ in 0..1000 {
            let id = JobId::generate();
            assert_eq!(id.0.len(), 32);
            assert!(id.0.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(seen.insert(id), "generated a duplicate job id");
        }
    }

    #[test]
    fn new_job_is_pending_with_zero_progress() {
        let job = Job::new(JobId::generate());
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0.0);
        assert!(job.artifact.is_none());
        assert!(job.error.is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Running).unwrap(),
            r#""running""#
        );
        assert_eq!(
            serde_json::to_string(&SnapshotStatus::Error).unwrap(),
            r#""error""#
        );
    }

    #[test]
    fn snapshot_omits_absent_fields() {
        let job = Job::new(JobId::generate());
        let snapshot = JobSnapshot::from(&job);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&snapshot).unwrap()).unwrap();

        assert_eq!(json["status"], "pending");
        assert_eq!(json["progress"], 0.0);
        assert!(json.get("filename").is_none());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn snapshot_of_completed_job_carries_filename() {
        let mut job = Job::new(JobId::generate());
        job.status = JobStatus::Completed;
        job.progress = 100.0;
        job.artifact = Some(Artifact {
            name: "clip.mp4".into(),
            path: "/tmp/clip.mp4".into(),
        });

        let snapshot = JobSnapshot::from(&job);
        assert_eq!(snapshot.status, SnapshotStatus::Completed);
        assert_eq!(snapshot.filename.as_deref(), Some("clip.mp4"));
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn unknown_snapshot_is_single_error_shape() {
        let snapshot = JobSnapshot::unknown();
        assert_eq!(snapshot.status, SnapshotStatus::Error);
        assert!(snapshot.error.is_some());
        assert!(snapshot.filename.is_none());
    }

    #[test]
    fn direct_url_info_serializes_camel_case() {
        let info = DirectUrlInfo {
            direct_url: "https://cdn.example/v.mp4".into(),
            filename: "v.mp4".into(),
            filesize: Some(1024),
            expires_in: 3600,
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&info).unwrap()).unwrap();
        assert_eq!(json["directUrl"], "https://cdn.example/v.mp4");
        assert_eq!(json["expiresIn"], 3600);
        assert_eq!(json["filesize"], 1024);
    }
}
