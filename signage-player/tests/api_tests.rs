//! Integration tests for the signage-player HTTP API
//!
//! Requests go through the router with `tower::ServiceExt::oneshot`; the
//! scheduler is wired to fake renderers and the loop is not started.

mod helpers;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use helpers::Harness;
use signage_player::api::{create_router, AppContext};
use signage_player::config::PlayerConfig;
use signage_player::content_store::ContentStore;

const BOUNDARY: &str = "signage-test-boundary";

struct TestApp {
    router: axum::Router,
    harness: Harness,
    ctx: AppContext,
    _content_dir: TempDir,
}

async fn setup() -> TestApp {
    let content_dir = TempDir::new().unwrap();
    let harness = Harness::new();
    let store = ContentStore::init(content_dir.path()).await.unwrap();

    let ctx = AppContext {
        scheduler: Arc::clone(&harness.scheduler),
        store,
        config: Arc::new(PlayerConfig::default()),
        shutdown: harness.cancel.clone(),
    };

    TestApp {
        router: create_router(ctx.clone()),
        harness,
        ctx,
        _content_dir: content_dir,
    }
}

/// Helper function to make HTTP requests to the test router
async fn make_request(
    app: &TestApp,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(path);

    let request = match body {
        Some(json_body) => {
            request = request.header("content-type", "application/json");
            request.body(Body::from(json_body.to_string())).unwrap()
        }
        None => request.body(Body::empty()).unwrap(),
    };

    send(app, request).await
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json_body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };

    (status, json_body)
}

/// Build a multipart upload request with a `file` part and optional fields
fn upload_request(
    uri: &str,
    filename: &str,
    mime: &str,
    bytes: &[u8],
    fields: &[(&str, &str)],
) -> Request<Body> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            BOUNDARY, filename, mime
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup().await;

    let (status, body) = make_request(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "signage-player");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_upload_image_registers_and_stores() {
    let app = setup().await;

    let request = upload_request("/api/content/upload", "poster.png", "image/png", b"png-bytes", &[]);
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "image");
    assert_eq!(body["name"], "poster.png");
    assert_eq!(body["duration"], 10);
    let hash = body["file_hash"].as_str().unwrap();
    assert_eq!(hash.len(), 8);

    let path = body["path"].as_str().unwrap();
    assert!(path.ends_with(&format!("images/{}_poster.png", hash)));
    assert_eq!(std::fs::read(path).unwrap(), b"png-bytes");

    let (status, list) = make_request(&app, Method::GET, "/api/content", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], body["id"]);
}

#[tokio::test]
async fn test_upload_duration_from_query_and_form() {
    let app = setup().await;

    let request = upload_request("/api/content/upload?duration=7", "clip.mp4", "video/mp4", b"v", &[]);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "video");
    assert_eq!(body["duration"], 7);

    // Form field wins over the query parameter
    let request = upload_request(
        "/api/content/upload?duration=7",
        "clip2.mp4",
        "video/mp4",
        b"v2",
        &[("duration", "12")],
    );
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duration"], 12);
}

#[tokio::test]
async fn test_upload_rejects_unsupported_type_and_zero_duration() {
    let app = setup().await;

    let request = upload_request("/api/content/upload", "doc.pdf", "application/pdf", b"%PDF", &[]);
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("application/pdf"));

    let request = upload_request("/api/content/upload?duration=0", "a.png", "image/png", b"x", &[]);
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing registered, nothing stored
    let (_, list) = make_request(&app, Method::GET, "/api/content", None).await;
    assert!(list.as_array().unwrap().is_empty());
    let images = app.ctx.store.root().join("images");
    assert_eq!(std::fs::read_dir(images).unwrap().count(), 0);
}

#[tokio::test]
async fn test_add_web_content() {
    let app = setup().await;

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/content/web",
        Some(json!({"name": "Menu", "url": "https://example.com/menu", "duration": 20})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "web");
    assert_eq!(body["path"], "https://example.com/menu");
    assert_eq!(body["duration"], 20);
    assert!(body["file_hash"].is_null());

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/content/web",
        Some(json!({"name": "Bad", "url": "ftp://example.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_delete_content() {
    let app = setup().await;

    let request = upload_request("/api/content/upload", "a.png", "image/png", b"pixels", &[]);
    let (_, uploaded) = send(&app, request).await;
    let id = uploaded["id"].as_str().unwrap().to_string();
    let path = uploaded["path"].as_str().unwrap().to_string();

    let (status, body) =
        make_request(&app, Method::DELETE, &format!("/api/content/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deleted");
    assert!(!Path::new(&path).exists());

    let (status, body) =
        make_request(&app, Method::DELETE, &format!("/api/content/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");

    let (status, _) = make_request(&app, Method::DELETE, "/api/content/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_keeps_file_shared_with_identical_upload() {
    let app = setup().await;

    let (_, first) = send(
        &app,
        upload_request("/api/content/upload", "same.png", "image/png", b"same", &[]),
    )
    .await;
    let (_, second) = send(
        &app,
        upload_request("/api/content/upload", "same.png", "image/png", b"same", &[]),
    )
    .await;
    assert_eq!(first["path"], second["path"]);
    assert_ne!(first["id"], second["id"]);

    let uri = format!("/api/content/{}", first["id"].as_str().unwrap());
    let (status, _) = make_request(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(Path::new(second["path"].as_str().unwrap()).exists());
}

#[tokio::test]
async fn test_failed_registration_keeps_file_of_registered_duplicate() {
    let app = setup().await;

    let (status, first) = send(
        &app,
        upload_request("/api/content/upload", "same.png", "image/png", b"same", &[]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let shared_path = first["path"].as_str().unwrap().to_string();

    app.harness.registry.refuse_puts();
    let (status, body) = send(
        &app,
        upload_request("/api/content/upload", "same.png", "image/png", b"same", &[]),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");

    // The first descriptor is still registered and its file is intact
    assert!(Path::new(&shared_path).exists());
    let (_, list) = make_request(&app, Method::GET, "/api/content", None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], first["id"]);
}

#[tokio::test]
async fn test_failed_registration_removes_unshared_file() {
    let app = setup().await;
    app.harness.registry.refuse_puts();

    let (status, _) = send(
        &app,
        upload_request("/api/content/upload", "lonely.png", "image/png", b"lonely", &[]),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let images = app.ctx.store.root().join("images");
    assert_eq!(std::fs::read_dir(images).unwrap().count(), 0);
}

#[tokio::test]
async fn test_extractor_rejections_use_error_body() {
    let app = setup().await;

    // Query string that does not parse
    let request = upload_request(
        "/api/content/upload?duration=soon",
        "a.png",
        "image/png",
        b"x",
        &[],
    );
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"].is_string());

    // Malformed JSON bodies
    for path in ["/api/content/web", "/api/playlist"] {
        let request = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(body["status"], "error", "{}", path);
    }

    // Upload without a multipart body
    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/content/upload",
        Some(json!({"file": "a.png"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");

    let (_, list) = make_request(&app, Method::GET, "/api/content", None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_playlist_round_trip_filters_ids() {
    let app = setup().await;

    let (_, a) = make_request(
        &app,
        Method::POST,
        "/api/content/web",
        Some(json!({"name": "A", "url": "https://a.example"})),
    )
    .await;
    let (_, b) = make_request(
        &app,
        Method::POST,
        "/api/content/web",
        Some(json!({"name": "B", "url": "https://b.example"})),
    )
    .await;
    let unknown = uuid::Uuid::new_v4().to_string();

    let (status, body) = make_request(
        &app,
        Method::POST,
        "/api/playlist",
        Some(json!([b["id"], unknown, "garbage", a["id"], b["id"]])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "updated");
    assert_eq!(body["content_ids"], json!([b["id"], a["id"], b["id"]]));

    let (status, playlist) = make_request(&app, Method::GET, "/api/playlist", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(playlist, json!([b["id"], a["id"], b["id"]]));
}

#[tokio::test]
async fn test_player_state_endpoint() {
    let app = setup().await;

    let (status, body) = make_request(&app, Method::GET, "/api/player", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["current_content"].is_null());
    assert_eq!(body["is_playing"], false);
    assert_eq!(body["volume"], 0);
    assert!(body["last_update"].is_string());
}

#[tokio::test]
async fn test_event_stream_delivers_and_ends_on_shutdown() {
    let app = setup().await;

    let request = Request::builder()
        .uri("/events")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
    assert_eq!(app.harness.state.hub().subscriber_count(), 1);

    let mut body = response.into_body();

    let (_, added) = make_request(
        &app,
        Method::POST,
        "/api/content/web",
        Some(json!({"name": "Live", "url": "https://live.example"})),
    )
    .await;

    let frame = body.frame().await.unwrap().unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("event: content_added"), "{}", text);
    assert!(text.contains(added["id"].as_str().unwrap()), "{}", text);

    app.harness.cancel.cancel();
    assert!(body.frame().await.is_none(), "stream ends on shutdown");
}
