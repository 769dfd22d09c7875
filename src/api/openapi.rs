//! OpenAPI documentation and schema generation
//!
//! Defines the OpenAPI specification for the vidfetch REST API using utoipa
//! for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the vidfetch REST API
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "vidfetch REST API",
        version = "0.1.0",
        description = "REST API for downloading social-media videos: metadata lookup, direct-URL resolution, and tracked background downloads with progress streaming"
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Media
        crate::api::routes::fetch_metadata,
        crate::api::routes::get_direct_url,
        crate::api::routes::stream_redirect,
        crate::api::routes::thumbnail_proxy,

        // Downloads
        crate::api::routes::start_download,
        crate::api::routes::download_progress,
        crate::api::routes::download_file,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobId,
        crate::types::JobStatus,
        crate::types::SnapshotStatus,
        crate::types::JobSnapshot,
        crate::types::Metadata,
        crate::types::DirectUrlInfo,
        crate::policy::PlatformPolicy,

        // API request/response types from routes
        crate::api::routes::UrlRequest,
        crate::api::routes::ThumbnailQuery,
        crate::api::routes::StartDownloadResponse,
        crate::api::routes::MetadataResponse,
        crate::api::routes::DirectUrlResponse,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "media", description = "Metadata lookup, direct URLs, streaming redirects, and thumbnail proxying"),
        (name = "downloads", description = "Tracked background downloads - start jobs, stream progress, fetch files"),
        (name = "system", description = "System endpoints - landing page, health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
