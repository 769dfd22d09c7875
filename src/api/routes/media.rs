//! Media handlers: metadata, direct URLs, streaming redirects, thumbnails.

use crate::api::AppState;
use crate::api::routes::{DirectUrlResponse, MetadataResponse, ThumbnailQuery, UrlRequest};
use crate::error::{Error, Result};
use crate::fsutil;
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

/// POST /api/metadata - Fetch video metadata without downloading
#[utoipa::path(
    post,
    path = "/api/metadata",
    tag = "media",
    request_body = UrlRequest,
    responses(
        (status = 200, description = "Video metadata", body = MetadataResponse),
        (status = 400, description = "Invalid URL", body = crate::error::ApiError),
        (status = 403, description = "Upstream requires authentication", body = crate::error::ApiError),
        (status = 503, description = "Extractor unavailable", body = crate::error::ApiError)
    )
)]
pub async fn fetch_metadata(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<impl IntoResponse> {
    let data = state.service.fetch_metadata(&request.url).await?;
    Ok(Json(MetadataResponse {
        success: true,
        data,
    }))
}

/// POST /api/get-direct-url - Resolve a direct source URL
#[utoipa::path(
    post,
    path = "/api/get-direct-url",
    tag = "media",
    request_body = UrlRequest,
    responses(
        (status = 200, description = "Direct URL resolved", body = DirectUrlResponse),
        (status = 400, description = "Invalid URL", body = crate::error::ApiError),
        (status = 503, description = "Extractor unavailable", body = crate::error::ApiError)
    )
)]
pub async fn get_direct_url(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<impl IntoResponse> {
    let data = state.service.fetch_direct_url(&request.url).await?;
    Ok(Json(DirectUrlResponse {
        success: true,
        data,
    }))
}

/// POST /api/stream - Redirect the client to the direct source URL
///
/// Returns a 307 with a `Content-Disposition` hint so browsers treat the
/// redirected media as a download with a sensible filename.
#[utoipa::path(
    post,
    path = "/api/stream",
    tag = "media",
    request_body = UrlRequest,
    responses(
        (status = 307, description = "Redirect to the direct source URL"),
        (status = 400, description = "Invalid URL", body = crate::error::ApiError),
        (status = 503, description = "Extractor unavailable", body = crate::error::ApiError)
    )
)]
pub async fn stream_redirect(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<Response> {
    let info = state.service.fetch_direct_url(&request.url).await?;

    Response::builder()
        .status(StatusCode::TEMPORARY_REDIRECT)
        .header(header::LOCATION, &info.direct_url)
        .header(
            header::CONTENT_DISPOSITION,
            fsutil::content_disposition(&info.filename),
        )
        .body(axum::body::Body::empty())
        .map_err(|e| Error::ApiServer(e.to_string()))
}

/// GET /api/thumbnail?url= - Proxy a thumbnail image
///
/// Fetches the image server-side so browser clients are not blocked by the
/// source's CORS policy, and marks the response cacheable.
#[utoipa::path(
    get,
    path = "/api/thumbnail",
    tag = "media",
    params(
        ("url" = String, Query, description = "Thumbnail image URL to proxy")
    ),
    responses(
        (status = 200, description = "Thumbnail image bytes"),
        (status = 404, description = "Upstream did not return the image", body = crate::error::ApiError),
        (status = 502, description = "Upstream fetch failed", body = crate::error::ApiError)
    )
)]
pub async fn thumbnail_proxy(
    State(state): State<AppState>,
    Query(query): Query<ThumbnailQuery>,
) -> Result<Response> {
    let upstream = state.http.get(&query.url).send().await?;

    if !upstream.status().is_success() {
        return Err(Error::NotFound(format!("thumbnail at '{}'", query.url)));
    }

    // reqwest still speaks http 0.2; look the header up by name
    let content_type = upstream
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();
    let bytes = upstream.bytes().await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "public, max-age=3600")
        .body(axum::body::Body::from(bytes))
        .map_err(|e| Error::ApiServer(e.to_string()))
}
