//! Configuration types
//!
//! All sections deserialize with serde and fall back to sensible defaults, so
//! an empty config is fully usable. Durations are expressed in seconds
//! (fractional allowed) in serialized form.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Artifact storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outer download retry behavior
    #[serde(default)]
    pub retry: RetryConfig,

    /// Deferred cleanup and stale sweeping
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Progress subscription settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Artifact storage settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Explicit storage directory. When unset the directory is probed at
    /// startup: a temp-style directory on serverless platforms, a
    /// project-relative `temp_downloads` otherwise.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Retry configuration for whole-job download attempts
///
/// Unlike per-fragment retries (which the extractor performs internally),
/// these bound the number of times the runner re-invokes the extractor for a
/// job before declaring final failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total number of attempts, including the first (default: 3).
    /// A value of 1 means no retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }
}

/// Retention configuration
///
/// Artifact and record deletion are two independent scheduled actions;
/// deleting one never implies deleting the other.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Delay between serving an artifact and deleting the file (default: 2s)
    #[serde(default = "default_artifact_delay", with = "duration_serde")]
    pub artifact_delay: Duration,

    /// Additional delay before the job record is removed (default: 5s)
    #[serde(default = "default_record_delay", with = "duration_serde")]
    pub record_delay: Duration,

    /// Grace period before an unfetched completed job is cleaned up
    /// (default: 1 hour)
    #[serde(default = "default_stale_max_age", with = "duration_serde")]
    pub unfetched_grace: Duration,

    /// Age past which orphaned files in the storage area are swept at
    /// startup, regardless of job records (default: 1 hour)
    #[serde(default = "default_stale_max_age", with = "duration_serde")]
    pub stale_max_age: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            artifact_delay: Duration::from_secs(2),
            record_delay: Duration::from_secs(5),
            unfetched_grace: Duration::from_secs(3600),
            stale_max_age: Duration::from_secs(3600),
        }
    }
}

/// Progress subscription settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Cadence of snapshot emissions on a subscription stream (default: 500ms)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
        }
    }
}

/// REST API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address the API server binds to (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Whether to apply a CORS layer (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; empty or "*" allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Whether to serve the interactive Swagger UI (default: false)
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            swagger_ui: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_artifact_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_record_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_stale_max_age() -> Duration {
    Duration::from_secs(3600)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_true() -> bool {
    true
}

/// Serialize/deserialize `Duration` as fractional seconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("duration must be non-negative"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_usable() {
        let config = Config::default();

        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.initial_delay, Duration::from_secs(2));
        assert!(!config.retry.jitter);
        assert_eq!(config.retention.artifact_delay, Duration::from_secs(2));
        assert_eq!(config.retention.record_delay, Duration::from_secs(5));
        assert_eq!(config.retention.stale_max_age, Duration::from_secs(3600));
        assert_eq!(config.notify.poll_interval, Duration::from_millis(500));
        assert_eq!(config.api.bind_address.port(), 8000);
        assert!(config.api.cors_enabled);
        assert!(!config.api.swagger_ui);
        assert!(config.storage.dir.is_none());
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.notify.poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn partial_section_keeps_remaining_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"retry": {"max_attempts": 5}}"#).unwrap();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay, Duration::from_secs(2));
        assert_eq!(config.retry.backoff_multiplier, 2.0);
    }

    #[test]
    fn durations_deserialize_from_fractional_seconds() {
        let config: Config =
            serde_json::from_str(r#"{"notify": {"poll_interval": 0.25}}"#).unwrap();
        assert_eq!(config.notify.poll_interval, Duration::from_millis(250));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let result = serde_json::from_str::<Config>(r#"{"notify": {"poll_interval": -1}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn duration_round_trips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.retry.initial_delay, config.retry.initial_delay);
        assert_eq!(back.notify.poll_interval, config.notify.poll_interval);
    }
}
