//! # vidfetch
//!
//! Backend library for social-media video download services.
//!
//! ## Design Philosophy
//!
//! vidfetch is designed to be:
//! - **Extraction-delegated** - All site-specific logic lives in yt-dlp;
//!   the crate tracks jobs, progress, files, and retention
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Library-first** - A Rust crate with a thin optional REST surface
//! - **Observable** - Every job is watchable as a bounded snapshot stream
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use vidfetch::{Config, FetchService, YtDlpExtractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let extractor = Arc::new(YtDlpExtractor::discover()?);
//!     let service = FetchService::new(config.clone(), extractor).await?;
//!
//!     let id = service.start_download("https://example.com/watch?v=1").await?;
//!     println!("accepted job {id}");
//!
//!     // Or serve the REST API:
//!     vidfetch::api::start_api_server(service, Arc::new(config)).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Media extractor seam and the yt-dlp implementation
pub mod extract;
/// Storage-area helpers
pub mod fsutil;
/// Notification channel for job snapshots
pub mod notify;
/// Platform policy table
pub mod policy;
/// Progress normalization and reporting
pub mod progress;
/// Deferred cleanup and stale sweeping
pub mod retention;
/// Retry logic with exponential backoff
pub mod retry;
/// Job runner
pub mod runner;
/// Service facade
pub mod service;
/// Job store
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, RetentionConfig, RetryConfig};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use extract::{MediaExtractor, YtDlpExtractor};
pub use notify::Notifier;
pub use policy::{FetchOptions, PlatformPolicy};
pub use retention::RetentionManager;
pub use runner::JobRunner;
pub use service::FetchService;
pub use store::JobStore;
pub use types::{Job, JobId, JobSnapshot, JobStatus, Metadata, SnapshotStatus};

/// Run the service with graceful signal handling.
///
/// Waits for a termination signal, then stops accepting new downloads and
/// waits for in-flight jobs to finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(service: FetchService) -> Result<()> {
    wait_for_signal().await;
    service.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration can fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
