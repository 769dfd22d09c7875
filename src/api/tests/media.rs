use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn metadata_endpoint_returns_video_info() {
    let (app, _service, _dir) = test_app().await;

    let response = app
        .oneshot(json_request(
            "/api/metadata",
            serde_json::json!({"url": "https://example.com/watch?v=1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["title"], "Stub Title");
    assert_eq!(body["data"]["duration"], 42);
    assert_eq!(body["data"]["uploader"], "stub-channel");
}

#[tokio::test]
async fn metadata_endpoint_rejects_bad_urls() {
    let (app, _service, _dir) = test_app().await;

    let response = app
        .oneshot(json_request(
            "/api/metadata",
            serde_json::json!({"url": "nope"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn direct_url_endpoint_wraps_data_in_success_envelope() {
    let (app, _service, _dir) = test_app().await;

    let response = app
        .oneshot(json_request(
            "/api/get-direct-url",
            serde_json::json!({"url": "https://example.com/watch?v=1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["directUrl"], "https://cdn.example/video.mp4");
    assert_eq!(body["data"]["filename"], "video.mp4");
    assert_eq!(body["data"]["expiresIn"], 3600);
}

#[tokio::test]
async fn stream_endpoint_redirects_with_download_hint() {
    let (app, _service, _dir) = test_app().await;

    let response = app
        .oneshot(json_request(
            "/api/stream",
            serde_json::json!({"url": "https://example.com/watch?v=1"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok()),
        Some("https://cdn.example/video.mp4")
    );
    let disposition = response
        .headers()
        .get("content-disposition")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("video.mp4"));
}

#[tokio::test]
async fn thumbnail_proxy_relays_image_with_caching() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thumb.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"imagebytes".to_vec())
                .insert_header("content-type", "image/png"),
        )
        .mount(&upstream)
        .await;

    let (app, _service, _dir) = test_app().await;
    let thumb_url = format!("{}/thumb.jpg", upstream.uri());
    let request = Request::builder()
        .uri(format!(
            "/api/thumbnail?url={}",
            urlencoding::encode(&thumb_url)
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("image/png")
    );
    assert_eq!(
        response
            .headers()
            .get("cache-control")
            .and_then(|v| v.to_str().ok()),
        Some("public, max-age=3600")
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"imagebytes");
}

#[tokio::test]
async fn thumbnail_proxy_maps_upstream_404_to_not_found() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let (app, _service, _dir) = test_app().await;
    let thumb_url = format!("{}/missing.jpg", upstream.uri());
    let request = Request::builder()
        .uri(format!(
            "/api/thumbnail?url={}",
            urlencoding::encode(&thumb_url)
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test]
async fn thumbnail_proxy_maps_connection_failure_to_bad_gateway() {
    let (app, _service, _dir) = test_app().await;

    // Port 9 (discard) is not listening
    let request = Request::builder()
        .uri(format!(
            "/api/thumbnail?url={}",
            urlencoding::encode("http://127.0.0.1:9/x.jpg")
        ))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "network_error");
}
