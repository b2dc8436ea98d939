//! HTTP API tests

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use common::{Fixture, RecordingRunner};
use deployd::server::serve::router;
use deployd::server::state::ServerState;

const MANIFEST: &str = "\
namespace: prod
authToken: secret
deploy:
  web:
    package: a.tar
    script: d.sh
";

fn app(fx: &Fixture) -> Router {
    router(
        Arc::new(ServerState::new(fx.engine.clone())),
        Duration::from_secs(15),
    )
}

fn post_manifest(content_type: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/deploy")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_deploy_requires_yaml_content_type() {
    let mut fx = Fixture::with_runner(None, Arc::new(RecordingRunner::default()));

    let response = app(&fx)
        .oneshot(post_manifest("application/json", MANIFEST))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert!(body_string(response).await.contains("text/x-yaml"));
    assert!(fx.queue.try_recv().is_err());
}

#[tokio::test]
async fn test_deploy_accepts_content_type_parameters() {
    let fx = Fixture::with_runner(None, Arc::new(RecordingRunner::default()));

    let response = app(&fx)
        .oneshot(post_manifest("Text/X-YAML; charset=utf-8", MANIFEST))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_deploy_rejects_bad_yaml_with_sample() {
    let mut fx = Fixture::with_runner(None, Arc::new(RecordingRunner::default()));

    let response = app(&fx)
        .oneshot(post_manifest("text/x-yaml", "deploy: [unclosed"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("sample yaml"));
    assert!(body.contains("authToken"));
    assert!(fx.queue.try_recv().is_err());
}

#[tokio::test]
async fn test_deploy_rejects_manifest_without_packages() {
    let fx = Fixture::with_runner(None, Arc::new(RecordingRunner::default()));

    let response = app(&fx)
        .oneshot(post_manifest("text/x-yaml", "namespace: prod\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deploy_returns_handle_then_conflict() {
    let mut fx = Fixture::with_runner(None, Arc::new(RecordingRunner::default()));
    let app = app(&fx);

    let response = app
        .clone()
        .oneshot(post_manifest("text/x-yaml", MANIFEST))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let handle = body_string(response).await;
    assert_eq!(handle, "prod-10000");

    let response = app
        .oneshot(post_manifest("text/x-yaml", MANIFEST))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let task = fx.queue.try_recv().unwrap();
    assert_eq!(task.session.handle(), handle);
    assert!(fx.queue.try_recv().is_err());
}

#[tokio::test]
async fn test_status_root_is_ok() {
    let fx = Fixture::with_runner(None, Arc::new(RecordingRunner::default()));

    let response = app(&fx).oneshot(get("/api/v1/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");
}

#[tokio::test]
async fn test_status_lists_and_reads_session_logs() {
    let mut fx = Fixture::with_runner(Some("secret"), Arc::new(RecordingRunner::default()));
    let app = app(&fx);

    let response = app
        .clone()
        .oneshot(post_manifest("text/x-yaml", MANIFEST))
        .await
        .unwrap();
    let handle = body_string(response).await;
    fx.execute_next().await;

    // Namespace listing
    let response = app.clone().oneshot(get("/api/v1/status/prod")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entries: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], handle.as_str());
    assert!(entries[0]["created"].is_string());

    // Other namespaces see nothing
    let response = app.clone().oneshot(get("/api/v1/status/staging")).await.unwrap();
    assert_eq!(body_string(response).await, "[]");

    // Raw log
    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/status/{}", handle)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let log = body_string(response).await;
    assert!(log.contains("Token OK, will start tasks."));
    assert!(log.contains("End of deploy task web"));
}

#[tokio::test]
async fn test_status_unknown_session_is_not_found() {
    let fx = Fixture::with_runner(None, Arc::new(RecordingRunner::default()));

    let response = app(&fx)
        .oneshot(get("/api/v1/status/prod-99999"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_status_rejects_unsafe_key() {
    let fx = Fixture::with_runner(None, Arc::new(RecordingRunner::default()));

    let response = app(&fx)
        .oneshot(get("/api/v1/status/..-1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health() {
    let fx = Fixture::with_runner(None, Arc::new(RecordingRunner::default()));

    let response = app(&fx).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["service"], "deployd");
}

#[tokio::test]
async fn test_status_lists_namespace_ending_in_digits() {
    let mut fx = Fixture::with_runner(Some("secret"), Arc::new(RecordingRunner::default()));
    let app = app(&fx);

    let manifest = MANIFEST.replace("namespace: prod", "namespace: web-1");
    let response = app
        .clone()
        .oneshot(post_manifest("text/x-yaml", &manifest))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let handle = body_string(response).await;
    assert_eq!(handle, "web-1-10000");
    fx.execute_next().await;

    let response = app.clone().oneshot(get("/api/v1/status/web-1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let entries: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["name"], handle.as_str());

    // The session itself is still readable, and `web` has no sessions
    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/status/{}", handle)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("End of deploy task web"));

    let response = app.oneshot(get("/api/v1/status/web")).await.unwrap();
    assert_eq!(body_string(response).await, "[]");
}
