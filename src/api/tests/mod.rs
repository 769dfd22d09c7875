use super::*;
use crate::error::Result;
use crate::extract::MediaExtractor;
use crate::policy::FetchOptions;
use crate::progress::ProgressSink;
use crate::types::{DirectUrlInfo, JobId, LocalFile, Metadata, RawProgress, SnapshotStatus};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::path::Path;
use std::time::Duration;
use tower::ServiceExt;

mod media;

/// Extractor test double with canned successful responses
struct StubExtractor;

#[async_trait]
impl MediaExtractor for StubExtractor {
    async fn fetch_metadata(&self, url: &str) -> Result<Metadata> {
        Ok(Metadata {
            title: "Stub Title".into(),
            thumbnail: "https://img.example/t.jpg".into(),
            duration: 42,
            uploader: "stub-channel".into(),
            url: url.into(),
            platform: "stub".into(),
        })
    }

    async fn fetch_direct_url(&self, _url: &str) -> Result<DirectUrlInfo> {
        Ok(DirectUrlInfo {
            direct_url: "https://cdn.example/video.mp4".into(),
            filename: "video.mp4".into(),
            filesize: Some(2048),
            expires_in: 3600,
        })
    }

    async fn download(
        &self,
        _url: &str,
        _options: &FetchOptions,
        dest_dir: &Path,
        progress: std::sync::Arc<dyn ProgressSink>,
    ) -> Result<LocalFile> {
        progress.report(RawProgress::Percent("100".into())).await;
        let path = dest_dir.join("video.mp4");
        tokio::fs::write(&path, b"stub bytes").await?;
        Ok(LocalFile {
            name: "video.mp4".into(),
            path,
        })
    }
}

/// Build a test config pointing storage at a temp dir, with fast timings
fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.dir = Some(dir.to_path_buf());
    config.retry.initial_delay = Duration::from_millis(5);
    config.notify.poll_interval = Duration::from_millis(5);
    config.retention.artifact_delay = Duration::from_millis(20);
    config.retention.record_delay = Duration::from_millis(20);
    config
}

/// Create a router, its backing service, and the storage temp dir
async fn test_app() -> (Router, FetchService, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = test_config(dir.path());
    let service = FetchService::new(config.clone(), std::sync::Arc::new(StubExtractor))
        .await
        .expect("service");
    let app = create_router(service.clone(), Arc::new(config));
    (app, service, dir)
}

/// Poll a job until it reaches a terminal state
async fn wait_terminal(service: &FetchService, id: &JobId) {
    for _ in 0..200 {
        if let Some(snapshot) = service.snapshot(id).await
            && matches!(
                snapshot.status,
                SnapshotStatus::Completed | SnapshotStatus::Failed
            )
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} did not reach a terminal state");
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn cors_headers_present_when_enabled() {
    let (app, _service, _dir) = test_app().await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn cors_headers_absent_when_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.api.cors_enabled = false;
    let service = FetchService::new(config.clone(), std::sync::Arc::new(StubExtractor))
        .await
        .unwrap();
    let app = create_router(service, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn api_server_binds_and_serves() {
    let dir = tempfile::tempdir().unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = test_config(dir.path());
    config.api.bind_address = addr;
    let service = FetchService::new(config.clone(), std::sync::Arc::new(StubExtractor))
        .await
        .unwrap();
    let app = create_router(service, Arc::new(config));

    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let response = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body = response.json::<serde_json::Value>().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    server.abort();
}
