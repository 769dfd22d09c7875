//! Application state for the API server

use crate::{Config, FetchService};
use std::sync::Arc;
use std::time::Duration;

/// Shared application state accessible to all route handlers
///
/// Cloned per request (cheap Arc clones) and provides access to the service
/// facade, configuration, and the outbound HTTP client used by the thumbnail
/// proxy.
#[derive(Clone)]
pub struct AppState {
    /// The download service facade
    pub service: FetchService,

    /// Configuration (read access)
    pub config: Arc<Config>,

    /// Outbound HTTP client for proxying thumbnails
    pub http: reqwest::Client,
}

impl AppState {
    /// Create a new AppState
    pub fn new(service: FetchService, config: Arc<Config>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            service,
            config,
            http,
        }
    }
}
