//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`media`] — Metadata, direct URLs, streaming redirects, thumbnails
//! - [`jobs`] — Download jobs: start, progress stream, file serving
//! - [`system`] — Landing page, health, OpenAPI

use crate::types::{DirectUrlInfo, JobId, Metadata};
use serde::{Deserialize, Serialize};

mod jobs;
mod media;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use jobs::*;
pub use media::*;
pub use system::*;

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body carrying a single video URL
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UrlRequest {
    /// The video page URL
    pub url: String,
}

/// Query parameters for GET /api/thumbnail
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ThumbnailQuery {
    /// Thumbnail image URL to proxy
    pub url: String,
}

/// Response for POST /api/download/start
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartDownloadResponse {
    /// Token for polling progress and fetching the file
    pub download_id: JobId,
}

/// Response for POST /api/metadata
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct MetadataResponse {
    /// Always true on success responses
    pub success: bool,
    /// The fetched metadata
    pub data: Metadata,
}

/// Response for POST /api/get-direct-url
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DirectUrlResponse {
    /// Always true on success responses
    pub success: bool,
    /// The resolved direct URL information
    pub data: DirectUrlInfo,
}
