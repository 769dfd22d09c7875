//! Download job handlers: start, progress stream, file serving.

use crate::api::AppState;
use crate::api::routes::{StartDownloadResponse, UrlRequest};
use crate::error::{Error, Result};
use crate::fsutil;
use crate::types::JobId;
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event as SseEvent, KeepAlive, Sse},
    },
};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_util::io::ReaderStream;

/// POST /api/download/start - Accept a download job
///
/// Returns 202 with the job id immediately; the download proceeds in the
/// background and is observable through the progress stream.
#[utoipa::path(
    post,
    path = "/api/download/start",
    tag = "downloads",
    request_body = UrlRequest,
    responses(
        (status = 202, description = "Download accepted", body = StartDownloadResponse),
        (status = 400, description = "Invalid URL", body = crate::error::ApiError),
        (status = 503, description = "Server is shutting down", body = crate::error::ApiError)
    )
)]
pub async fn start_download(
    State(state): State<AppState>,
    Json(request): Json<UrlRequest>,
) -> Result<impl IntoResponse> {
    let download_id = state.service.start_download(&request.url).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(StartDownloadResponse { download_id }),
    ))
}

/// GET /api/download/progress/:id - Job progress stream (SSE)
///
/// Emits one JSON snapshot per event until the job reaches a terminal state;
/// the terminal snapshot is the last event before the stream closes. Unknown
/// ids produce a single error-shaped snapshot. Because the stream is
/// pull-based, a client disconnect stops all polling for it.
#[utoipa::path(
    get,
    path = "/api/download/progress/{id}",
    tag = "downloads",
    params(
        ("id" = String, Path, description = "Download job id")
    ),
    responses(
        (status = 200, description = "Snapshot stream (text/event-stream)", content_type = "text/event-stream")
    )
)]
pub async fn download_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Sse<impl tokio_stream::Stream<Item = std::result::Result<SseEvent, Infallible>>> {
    let stream = state.service.watch(JobId(id)).map(|snapshot| {
        let data = serde_json::to_string(&snapshot).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to serialize snapshot");
            r#"{"status":"error","progress":0.0,"error":"serialization failure"}"#.to_string()
        });
        Ok(SseEvent::default().data(data))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /api/download/file/:id - Serve the downloaded file
///
/// Streams the artifact with a `Content-Disposition` attachment header and
/// schedules the deferred cleanup of the artifact and job record.
#[utoipa::path(
    get,
    path = "/api/download/file/{id}",
    tag = "downloads",
    params(
        ("id" = String, Path, description = "Download job id")
    ),
    responses(
        (status = 200, description = "The media file", content_type = "application/octet-stream"),
        (status = 400, description = "Download not complete", body = crate::error::ApiError),
        (status = 404, description = "Unknown id or file missing", body = crate::error::ApiError)
    )
)]
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id = JobId(id);
    let artifact = state.service.artifact_for_serving(&id).await?;

    let file = tokio::fs::File::open(&artifact.path).await?;
    let length = file.metadata().await.ok().map(|m| m.len());
    let body = axum::body::Body::from_stream(ReaderStream::new(file));

    // Cleanup is delayed long enough for the transfer to complete
    state.service.schedule_cleanup(id);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(
            header::CONTENT_DISPOSITION,
            fsutil::content_disposition(&artifact.name),
        );
    if let Some(length) = length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }
    builder
        .body(body)
        .map_err(|e| Error::ApiServer(e.to_string()))
}
