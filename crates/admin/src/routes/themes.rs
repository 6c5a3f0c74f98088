//! Theme lifecycle endpoints.

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use themedrop_core::{ThemeFileInput, ThemeId};
use tracing::instrument;

use crate::error::{DeployError, report};
use crate::services::ThemeStatus;
use crate::shopify::Theme;
use crate::state::AppState;

use super::{ApiJson, ApiQuery};

/// Build the themes router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/themes/create", post(create_theme))
        .route("/api/themes/update", post(update_theme))
        .route("/api/themes/files", post(upsert_files))
        .route("/api/themes/delete", post(delete_theme))
        .route("/api/themes/status", get(theme_status))
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThemeRequest {
    #[serde(default)]
    pub shop: String,
    /// `resourceUrl` from `/api/files/upload`.
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateThemeRequest {
    #[serde(default)]
    pub shop: String,
    pub theme_id: ThemeId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertFilesRequest {
    #[serde(default)]
    pub shop: String,
    pub theme_id: ThemeId,
    #[serde(default)]
    pub files: Vec<ThemeFileInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeRef {
    #[serde(default)]
    pub shop: String,
    pub theme_id: ThemeId,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertFilesResponse {
    pub upserted_files: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteThemeResponse {
    pub deleted_theme_id: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /api/themes/create
#[instrument(skip_all, fields(shop = %req.shop))]
async fn create_theme(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateThemeRequest>,
) -> Result<ApiJson<ThemeResponse>, DeployError> {
    let theme = state
        .deployer()
        .create_theme(&req.shop, &req.source, &req.name)
        .await?;
    Ok(ApiJson(ThemeResponse { theme }))
}

/// POST /api/themes/update
#[instrument(skip_all, fields(shop = %req.shop, theme_id = %req.theme_id))]
async fn update_theme(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpdateThemeRequest>,
) -> Result<ApiJson<ThemeResponse>, DeployError> {
    let theme = state
        .deployer()
        .update_theme_name(&req.shop, req.theme_id, &req.name)
        .await?;
    Ok(ApiJson(ThemeResponse { theme }))
}

/// POST /api/themes/files
#[instrument(skip_all, fields(shop = %req.shop, theme_id = %req.theme_id))]
async fn upsert_files(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UpsertFilesRequest>,
) -> Result<ApiJson<UpsertFilesResponse>, DeployError> {
    let upserted_files = state
        .deployer()
        .upsert_theme_files(&req.shop, req.theme_id, &req.files)
        .await?;
    Ok(ApiJson(UpsertFilesResponse { upserted_files }))
}

/// POST /api/themes/delete
#[instrument(skip_all, fields(shop = %req.shop, theme_id = %req.theme_id))]
async fn delete_theme(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ThemeRef>,
) -> Result<ApiJson<DeleteThemeResponse>, DeployError> {
    let deleted_theme_id = state
        .deployer()
        .delete_theme(&req.shop, req.theme_id)
        .await?;
    Ok(ApiJson(DeleteThemeResponse { deleted_theme_id }))
}

/// GET /api/themes/status?shop=&themeId=
///
/// Every failure, including a malformed query, is answered with
/// `processing: null` and the mapped status, so a poller never mistakes an
/// error for "done".
async fn theme_status(
    State(state): State<AppState>,
    query: Result<ApiQuery<ThemeRef>, DeployError>,
) -> Response {
    let result = match query {
        Ok(ApiQuery(query)) => state
            .deployer()
            .theme_status(&query.shop, query.theme_id)
            .await,
        Err(e) => Err(e),
    };

    match result {
        Ok(processing) => ApiJson(ThemeStatus::known(processing)).into_response(),
        Err(e) => {
            report(&e);
            (e.status_code(), ApiJson(ThemeStatus::unknown(&e))).into_response()
        }
    }
}
