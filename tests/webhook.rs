//! End-to-end tests for the webhook router.
//!
//! These drive the real axum service the way the API server would, minus
//! TLS (axum-server terminates TLS before the router sees the request).

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use mutating_webhook::{Config, RuleStore, WebhookState, create_webhook_router};

/// Router backed by the testdata config: one rule adding a label to Pods.
fn test_router() -> Router {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/testdata/config.yaml");
    let config = Config::load(&path).expect("test config should load");
    router_for(config)
}

fn router_for(config: Config) -> Router {
    create_webhook_router(Arc::new(WebhookState::new(RuleStore::from(config))))
}

fn admission_review(group: &str, version: &str, kind: &str) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "test-uid",
            "kind": {"group": group, "version": version, "kind": kind},
            "resource": {"group": group, "version": version, "resource": "pods"},
            "operation": "CREATE",
            "name": "test-pod",
            "namespace": "default",
            "userInfo": {"username": "admin"},
            "object": {
                "apiVersion": "v1",
                "kind": kind,
                "metadata": {"name": "test-pod"}
            }
        }
    })
}

async fn post_mutate(router: Router, body: Vec<u8>) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method("POST")
        .uri("/mutate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .expect("request should build");
    let response = router.oneshot(request).await.expect("router call");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    (status, bytes.to_vec())
}

fn decode_patch(response: &Value) -> Value {
    let encoded = response["patch"].as_str().expect("patch should be base64");
    let bytes = STANDARD.decode(encoded).expect("patch should decode");
    serde_json::from_slice(&bytes).expect("patch should be JSON")
}

#[tokio::test]
async fn test_adds_label_to_pod() {
    let review = admission_review("", "v1", "Pod");
    let (status, body) = post_mutate(test_router(), serde_json::to_vec(&review).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let result: Value = serde_json::from_slice(&body).unwrap();
    let response = &result["response"];
    assert_eq!(response["allowed"], true);
    assert_eq!(response["uid"], "test-uid");
    assert_eq!(response["patchType"], "JSONPatch");
    assert_eq!(
        decode_patch(response),
        json!([
            {"op": "add", "path": "/metadata/labels/example.com~1added", "value": "yes"}
        ])
    );
}

#[tokio::test]
async fn test_unmatched_resource_passes_through() {
    let review = admission_review("apps", "v1", "Deployment");
    let (status, body) = post_mutate(test_router(), serde_json::to_vec(&review).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let result: Value = serde_json::from_slice(&body).unwrap();
    let response = &result["response"];
    assert_eq!(response["allowed"], true);
    assert_eq!(response["uid"], "test-uid");
    assert!(response.get("patch").is_none());
    assert!(response.get("patchType").is_none());
}

#[tokio::test]
async fn test_envelope_without_request_is_denied() {
    let review = json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview"
    });
    let (status, body) = post_mutate(test_router(), serde_json::to_vec(&review).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let result: Value = serde_json::from_slice(&body).unwrap();
    let response = &result["response"];
    assert_eq!(response["allowed"], false);

    let message = response["status"]["message"].as_str().unwrap_or_default();
    assert!(!message.is_empty(), "denial should carry a message");

    // There was no request, so there is no uid to echo.
    let uid = response["uid"].as_str().unwrap_or_default();
    assert!(uid.is_empty());
}

#[tokio::test]
async fn test_two_matching_rules_concatenate_in_order() {
    let config = Config::from_yaml(
        r#"
mutations:
  - resource:
      version: v1
      kind: Pod
    patches:
      - op: add
        path: /metadata/labels/first
        value: "1"
  - resource:
      version: v1
      kind: Pod
    patches:
      - op: add
        path: /metadata/labels/second
        value: "2"
"#,
    )
    .unwrap();

    let review = admission_review("", "v1", "Pod");
    let (status, body) =
        post_mutate(router_for(config), serde_json::to_vec(&review).unwrap()).await;
    assert_eq!(status, StatusCode::OK);

    let result: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        decode_patch(&result["response"]),
        json!([
            {"op": "add", "path": "/metadata/labels/first", "value": "1"},
            {"op": "add", "path": "/metadata/labels/second", "value": "2"},
        ])
    );
}

#[tokio::test]
async fn test_malformed_envelope_is_client_error() {
    let (status, _) = post_mutate(test_router(), b"not json at all".to_vec()).await;
    assert!(status.is_client_error(), "got {status}");
}

#[tokio::test]
async fn test_health_check() {
    let request = Request::builder()
        .method("GET")
        .uri("/healthz")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"OK");
}
