//! REST API server module
//!
//! A thin HTTP surface over [`FetchService`]: request parsing, response
//! shaping, and SSE framing. All job semantics live in the core; handlers
//! translate between HTTP and the facade.

use crate::{Config, FetchService, Result};
use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Media
/// - `POST /api/metadata` - Fetch video metadata without downloading
/// - `POST /api/get-direct-url` - Resolve a direct source URL
/// - `POST /api/stream` - Redirect to the direct source URL
/// - `GET /api/thumbnail?url=` - Proxy a thumbnail image
///
/// ## Downloads
/// - `POST /api/download/start` - Accept a download job
/// - `GET /api/download/progress/:id` - Job progress stream (SSE)
/// - `GET /api/download/file/:id` - Serve the downloaded file
///
/// ## System
/// - `GET /` - Landing page
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive API documentation (if enabled)
pub fn create_router(service: FetchService, config: Arc<Config>) -> Router {
    let state = AppState::new(service, config.clone());

    let router = Router::new()
        // Media
        .route("/api/metadata", post(routes::fetch_metadata))
        .route("/api/get-direct-url", post(routes::get_direct_url))
        .route("/api/stream", post(routes::stream_redirect))
        .route("/api/thumbnail", get(routes::thumbnail_proxy))
        // Downloads
        .route("/api/download/start", post(routes::start_download))
        .route("/api/download/progress/:id", get(routes::download_progress))
        .route("/api/download/file/:id", get(routes::download_file))
        // System
        .route("/", get(routes::index))
        .route("/health", get(routes::health_check));

    // Swagger UI registers GET /openapi.json itself; mounting both would
    // overlap and panic at router construction
    let router = if config.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/openapi.json", ApiDoc::openapi()))
    } else {
        router.route("/openapi.json", get(routes::openapi_spec))
    };

    let router = router.with_state(state);

    // Apply CORS middleware if enabled in config
    if config.api.cors_enabled {
        let cors = build_cors_layer(&config.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// An empty list or a `"*"` entry allows any origin; otherwise only the
/// listed origins are allowed, with all methods and headers.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address
///
/// Binds a TCP listener and serves the router until the server stops.
pub async fn start_api_server(service: FetchService, config: Arc<Config>) -> Result<()> {
    let bind_address = config.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(service, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServer(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
