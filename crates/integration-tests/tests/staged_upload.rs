//! Staged upload pipeline: stage a target, then transfer the archive to it.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;
use themedrop_admin::error::DeployError;
use themedrop_admin::shopify::{Artifact, StagedUpload};
use themedrop_integration_tests::{
    MemoryCredentialStore, Recorded, SHOP, StubPlatform, TOKEN, credential,
};

const RESOURCE_URL: &str = "https://shopify-staged-uploads.storage.googleapis.com/tmp/62/theme.zip";

fn archive() -> Artifact {
    Artifact::new(b"PK\x03\x04theme".to_vec(), Some("spring.zip".to_string()), None).unwrap()
}

#[tokio::test]
async fn test_upload_returns_resource_url_and_transfers_once() {
    let stub = StubPlatform::start().await;
    stub.stage_target(
        RESOURCE_URL,
        &[
            ("Content-Type", "application/zip"),
            ("success_action_status", "201"),
            ("key", "tmp/62/theme.zip"),
            ("policy", "eyJjb25kaXRpb25zIjpbXX0="),
        ],
    );
    let deployer = stub.deployer(Arc::new(MemoryCredentialStore::with_valid_shop()));

    let resource_url = deployer.upload_artifact(SHOP, archive()).await.unwrap();
    assert_eq!(resource_url, RESOURCE_URL);

    let requests = stub.requests();
    assert_eq!(requests.len(), 2);

    let Recorded::Graphql {
        operation,
        variables,
        access_token,
    } = &requests[0]
    else {
        panic!("expected staging first");
    };
    assert_eq!(operation, "StagedUploadsCreate");
    assert_eq!(access_token.as_deref(), Some(TOKEN));
    let input = &variables["input"][0];
    assert_eq!(input["filename"], "spring.zip");
    assert_eq!(input["mimeType"], "application/zip");
    assert_eq!(input["resource"], "FILE");
    assert_eq!(input["httpMethod"], "POST");
    assert_eq!(input["fileSize"], "9");

    let Recorded::Upload {
        fields,
        values,
        file_name,
        content_type,
        file,
        access_token,
    } = &requests[1]
    else {
        panic!("expected the transfer second");
    };
    assert_eq!(
        fields,
        &vec![
            "Content-Type".to_string(),
            "success_action_status".to_string(),
            "key".to_string(),
            "policy".to_string(),
            "file".to_string(),
        ]
    );
    assert_eq!(values["key"], "tmp/62/theme.zip");
    assert_eq!(file_name.as_deref(), Some("spring.zip"));
    assert_eq!(content_type.as_deref(), Some("application/zip"));
    assert_eq!(file, b"PK\x03\x04theme");
    assert!(access_token.is_none(), "transfer must not carry the Admin token");
}

#[tokio::test]
async fn test_empty_target_list_is_distinct_and_skips_transfer() {
    let stub = StubPlatform::start().await;
    stub.respond_data(
        "StagedUploadsCreate",
        "stagedUploadsCreate",
        json!({"stagedTargets": [], "userErrors": []}),
    );
    let deployer = stub.deployer(Arc::new(MemoryCredentialStore::with_valid_shop()));

    let err = deployer.upload_artifact(SHOP, archive()).await.unwrap_err();
    assert!(matches!(err, DeployError::NoStagedTarget));
    assert_eq!(err.status_code().as_u16(), 500);
    assert_eq!(stub.upload_count(), 0);
}

#[tokio::test]
async fn test_staging_user_errors_are_domain_failure() {
    let stub = StubPlatform::start().await;
    stub.respond_data(
        "StagedUploadsCreate",
        "stagedUploadsCreate",
        json!({
            "stagedTargets": [],
            "userErrors": [{"field": ["input", "0", "fileSize"], "message": "File size is too large"}]
        }),
    );
    let deployer = stub.deployer(Arc::new(MemoryCredentialStore::with_valid_shop()));

    let err = deployer.upload_artifact(SHOP, archive()).await.unwrap_err();
    let DeployError::Domain(errors) = &err else {
        panic!("expected a domain failure, got {err:?}");
    };
    assert_eq!(errors[0].field.as_deref().map(<[String]>::len), Some(3));
    assert_eq!(errors[0].message, "File size is too large");
    assert_eq!(stub.upload_count(), 0);
}

#[tokio::test]
async fn test_rejected_transfer_is_not_retried() {
    let stub = StubPlatform::start().await;
    stub.stage_target(RESOURCE_URL, &[("key", "tmp/62/theme.zip")]);
    stub.respond_upload(403, "<Error><Code>AccessDenied</Code></Error>");
    let deployer = stub.deployer(Arc::new(MemoryCredentialStore::with_valid_shop()));

    let err = deployer.upload_artifact(SHOP, archive()).await.unwrap_err();
    assert!(matches!(
        &err,
        DeployError::Transport { status: Some(403), body } if body.contains("AccessDenied")
    ));
    assert_eq!(stub.operations(), vec!["StagedUploadsCreate"]);
    assert_eq!(stub.upload_count(), 1);
}

#[tokio::test]
async fn test_expired_credential_stages_nothing() {
    let stub = StubPlatform::start().await;
    let deployer = stub.deployer(Arc::new(MemoryCredentialStore::with_expired_shop()));

    let err = deployer.upload_artifact(SHOP, archive()).await.unwrap_err();
    assert!(matches!(err, DeployError::Expired(_)));
    assert!(stub.requests().is_empty());
}

#[tokio::test]
async fn test_pipeline_steps_expose_the_issued_target() {
    let stub = StubPlatform::start().await;
    stub.stage_target(RESOURCE_URL, &[("key", "tmp/62/theme.zip")]);
    let gateway = stub.gateway();
    let credential = credential(SHOP, TOKEN, None);

    let staged = StagedUpload::new(&gateway, &credential, archive())
        .stage()
        .await
        .unwrap();
    assert_eq!(staged.target().resource_url, RESOURCE_URL);
    assert_eq!(staged.target().upload_url, stub.upload_url());
    assert_eq!(
        staged.target().parameters,
        vec![("key".to_string(), "tmp/62/theme.zip".to_string())]
    );
    assert_eq!(stub.upload_count(), 0);

    let resource_url = staged.transfer().await.unwrap();
    assert_eq!(resource_url, RESOURCE_URL);
    assert_eq!(stub.upload_count(), 1);
}
