//! Theme operations for the Admin API.

use serde::de::DeserializeOwned;
use serde_json::Value;
use themedrop_core::{ThemeFileInput, ThemeId};
use tracing::instrument;

use crate::db::StoreCredential;
use crate::error::DeployError;

use super::types::{
    Theme, ThemeDeletePayload, ThemeFilesUpsertPayload, ThemePayload, ThemeProcessing,
};
use super::{AdminGateway, RemoteResult, queries};

/// Decode a classified payload, treating an unexpected shape as unknown.
fn decode<T: DeserializeOwned>(result: RemoteResult<Value>, what: &str) -> Result<T, DeployError> {
    let value = result.into_result()?;
    serde_json::from_value(value)
        .map_err(|e| DeployError::Unknown(format!("Unexpected {what} payload: {e}")))
}

impl AdminGateway {
    /// Create a theme from a staged archive.
    ///
    /// # Arguments
    ///
    /// * `source` - `resourceUrl` from a staged upload (or any archive URL)
    /// * `name` - Theme display name
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, returns user errors, or
    /// omits the theme.
    #[instrument(skip(self, credential), fields(shop = %credential.shop))]
    pub async fn create_theme(
        &self,
        credential: &StoreCredential,
        source: &str,
        name: &str,
    ) -> Result<Theme, DeployError> {
        let result = self
            .send(credential, &queries::theme_create(source, name))
            .await;
        let payload: ThemePayload = decode(result, "themeCreate")?;
        payload
            .theme
            .ok_or_else(|| DeployError::Api("themeCreate returned no theme".to_string()))
    }

    /// Rename a theme.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, returns user errors, or
    /// omits the theme.
    #[instrument(skip(self, credential, theme_id), fields(shop = %credential.shop, theme_id = %theme_id))]
    pub async fn update_theme_name(
        &self,
        credential: &StoreCredential,
        theme_id: ThemeId,
        name: &str,
    ) -> Result<Theme, DeployError> {
        let result = self
            .send(credential, &queries::theme_update(theme_id, name))
            .await;
        let payload: ThemePayload = decode(result, "themeUpdate")?;
        payload
            .theme
            .ok_or_else(|| DeployError::Api("themeUpdate returned no theme".to_string()))
    }

    /// Write file contents into a theme, returning the upserted filenames.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or returns user errors.
    #[instrument(skip(self, credential, theme_id, files), fields(shop = %credential.shop, theme_id = %theme_id, files = files.len()))]
    pub async fn upsert_theme_files(
        &self,
        credential: &StoreCredential,
        theme_id: ThemeId,
        files: &[ThemeFileInput],
    ) -> Result<Vec<String>, DeployError> {
        let result = self
            .send(credential, &queries::theme_files_upsert(theme_id, files))
            .await;
        let payload: ThemeFilesUpsertPayload = decode(result, "themeFilesUpsert")?;
        Ok(payload
            .upserted_theme_files
            .unwrap_or_default()
            .into_iter()
            .map(|f| f.filename)
            .collect())
    }

    /// Delete a theme, returning the deleted theme's global ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails, returns user errors, or
    /// omits the deleted ID.
    #[instrument(skip(self, credential, theme_id), fields(shop = %credential.shop, theme_id = %theme_id))]
    pub async fn delete_theme(
        &self,
        credential: &StoreCredential,
        theme_id: ThemeId,
    ) -> Result<String, DeployError> {
        let result = self.send(credential, &queries::theme_delete(theme_id)).await;
        let payload: ThemeDeletePayload = decode(result, "themeDelete")?;
        payload
            .deleted_theme_id
            .ok_or_else(|| DeployError::Api("themeDelete returned no deletedThemeId".to_string()))
    }

    /// Read a theme's processing state.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the theme is missing.
    #[instrument(skip(self, credential, theme_id), fields(shop = %credential.shop, theme_id = %theme_id))]
    pub async fn theme_processing(
        &self,
        credential: &StoreCredential,
        theme_id: ThemeId,
    ) -> Result<ThemeProcessing, DeployError> {
        let result = self.send(credential, &queries::theme_status(theme_id)).await;
        decode(result, "theme")
    }
}
