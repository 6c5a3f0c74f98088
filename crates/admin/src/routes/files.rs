//! Archive upload endpoint.

use axum::{Router, extract::State, routing::post};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::DeployError;
use crate::shopify::Artifact;
use crate::state::AppState;

use super::ApiJson;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/files/upload", post(upload_file))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequest {
    #[serde(default)]
    pub shop: String,
    /// Base64-encoded archive bytes.
    #[serde(default)]
    pub file_data: String,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileResponse {
    pub resource_url: String,
}

/// POST /api/files/upload
///
/// Decodes the archive, stages it, and transfers it. The returned
/// `resourceUrl` is the `source` for `/api/themes/create`.
#[instrument(skip_all, fields(shop = %req.shop))]
async fn upload_file(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UploadFileRequest>,
) -> Result<ApiJson<UploadFileResponse>, DeployError> {
    let artifact = Artifact::new(
        decode_file_data(&req.file_data)?,
        req.filename,
        req.mime_type,
    )?;

    let resource_url = state.deployer().upload_artifact(&req.shop, artifact).await?;
    Ok(ApiJson(UploadFileResponse { resource_url }))
}

fn decode_file_data(file_data: &str) -> Result<Vec<u8>, DeployError> {
    let file_data = file_data.trim();
    if file_data.is_empty() {
        return Err(DeployError::Input("fileData is required".to_string()));
    }
    STANDARD
        .decode(file_data)
        .map_err(|e| DeployError::Input(format!("fileData is not valid base64: {e}")))
}
