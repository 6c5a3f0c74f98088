//! Calls that never get an HTTP response: refused connections and timeouts.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use serde_json::{Value, json};
use themedrop_admin::error::DeployError;
use themedrop_admin::shopify::Artifact;
use themedrop_core::ThemeId;
use themedrop_integration_tests::{
    MemoryCredentialStore, SHOP, StubPlatform, app_with, closed_origin, deployer_with,
    gateway_for,
};
use tower::ServiceExt;

const THEME_GID: &str = "gid://shopify/OnlineStoreTheme/42";
const RESOURCE_URL: &str = "https://shopify-staged-uploads.storage.googleapis.com/tmp/7/theme.zip";

fn archive() -> Artifact {
    Artifact::new(b"PK\x03\x04".to_vec(), None, None).unwrap()
}

fn assert_no_response(err: &DeployError) {
    let DeployError::Transport { status, body } = err else {
        panic!("expected a transport failure, got {err:?}");
    };
    assert_eq!(*status, None);
    assert!(!body.is_empty());
    assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// GraphQL endpoint
// ============================================================================

#[tokio::test]
async fn test_refused_connection_is_transport_failure_without_status() {
    let origin = closed_origin().await;
    let deployer = deployer_with(
        Arc::new(MemoryCredentialStore::with_valid_shop()),
        gateway_for(&origin, None),
    );

    let err = deployer
        .delete_theme(SHOP, ThemeId::new(42))
        .await
        .unwrap_err();

    assert_no_response(&err);
    assert!(
        err.to_string().starts_with("Request to Shopify failed: "),
        "{err}"
    );
}

#[tokio::test]
async fn test_refused_connection_route_answers_500() {
    let origin = closed_origin().await;
    let app = app_with(deployer_with(
        Arc::new(MemoryCredentialStore::with_valid_shop()),
        gateway_for(&origin, None),
    ));

    let request = Request::post("/api/themes/delete")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"shop": SHOP, "themeId": 42}).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Request to Shopify failed: ")
    );
}

#[tokio::test]
async fn test_slow_platform_times_out_as_transport_failure() {
    let stub = StubPlatform::start().await;
    stub.respond_after(
        "ThemeDelete",
        Duration::from_secs(5),
        &json!({"data": {"themeDelete": {"deletedThemeId": THEME_GID, "userErrors": []}}}),
    );
    let deployer = deployer_with(
        Arc::new(MemoryCredentialStore::with_valid_shop()),
        stub.gateway_with_timeout(Duration::from_millis(200)),
    );

    let err = deployer
        .delete_theme(SHOP, ThemeId::new(42))
        .await
        .unwrap_err();

    assert_no_response(&err);
    assert_eq!(stub.operations(), vec!["ThemeDelete"]);
}

#[tokio::test]
async fn test_slow_status_poll_is_unknown_not_false() {
    let stub = StubPlatform::start().await;
    stub.respond_after(
        "ThemeStatus",
        Duration::from_secs(5),
        &json!({"data": {"theme": {"id": THEME_GID, "processing": false}}}),
    );
    let app = app_with(deployer_with(
        Arc::new(MemoryCredentialStore::with_valid_shop()),
        stub.gateway_with_timeout(Duration::from_millis(200)),
    ));

    let request = Request::get(format!("/api/themes/status?shop={SHOP}&themeId=42"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["processing"].is_null());
    assert!(body["error"].is_string());
}

// ============================================================================
// Staged transfer
// ============================================================================

#[tokio::test]
async fn test_unreachable_upload_url_is_transport_failure_with_cause() {
    let stub = StubPlatform::start().await;
    let upload_url = format!("{}/upload", closed_origin().await);
    stub.stage_target_at(&upload_url, RESOURCE_URL, &[("key", "tmp/7/theme.zip")]);
    let deployer = stub.deployer(Arc::new(MemoryCredentialStore::with_valid_shop()));

    let err = deployer.upload_artifact(SHOP, archive()).await.unwrap_err();

    assert_no_response(&err);
    let DeployError::Transport { body, .. } = &err else {
        unreachable!();
    };
    assert!(
        body.to_lowercase().contains("connection refused"),
        "cause chain missing: {body}"
    );
    assert_eq!(stub.operations(), vec!["StagedUploadsCreate"]);
    assert_eq!(stub.upload_count(), 0);
}

#[tokio::test]
async fn test_unparseable_mime_type_is_rejected_before_staging() {
    let stub = StubPlatform::start().await;
    stub.stage_target(RESOURCE_URL, &[("key", "tmp/7/theme.zip")]);
    let app = stub.app(Arc::new(MemoryCredentialStore::with_valid_shop()));

    let request = Request::post("/api/files/upload")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "shop": SHOP,
                "fileData": "UEsDBA==",
                "mimeType": "application/zip/extra"
            })
            .to_string(),
        ))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(stub.operations().is_empty());
    assert_eq!(stub.upload_count(), 0);
}
