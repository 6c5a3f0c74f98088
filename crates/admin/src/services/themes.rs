//! Theme deployment operations.
//!
//! Each operation validates its input, resolves the shop's credential, makes
//! its remote call(s), and maps the outcome into a typed result. Input and
//! credential failures never reach the network.

use serde::Serialize;
use themedrop_core::{ThemeFileInput, ThemeId};
use tracing::instrument;

use crate::error::DeployError;
use crate::shopify::{AdminGateway, Artifact, Theme, ThemeProcessing};

use super::CredentialResolver;

/// Entry point for every theme deployment action.
#[derive(Clone)]
pub struct ThemeDeployer {
    resolver: CredentialResolver,
    gateway: AdminGateway,
}

impl ThemeDeployer {
    #[must_use]
    pub const fn new(resolver: CredentialResolver, gateway: AdminGateway) -> Self {
        Self { resolver, gateway }
    }

    /// Stage and transfer an archive, returning the `resourceUrl` to pass to
    /// [`ThemeDeployer::create_theme`].
    ///
    /// Not idempotent: every call consumes a fresh staging target.
    ///
    /// # Errors
    ///
    /// Credential failures, staging failures (including
    /// `DeployError::NoStagedTarget`), or a rejected transfer.
    #[instrument(skip(self, artifact), fields(filename = artifact.filename(), size = artifact.len()))]
    pub async fn upload_artifact(&self, shop: &str, artifact: Artifact) -> Result<String, DeployError> {
        let credential = self.resolver.resolve(shop).await?;
        self.gateway.upload_artifact(&credential, artifact).await
    }

    /// Create a theme from an uploaded archive.
    ///
    /// # Errors
    ///
    /// `DeployError::Input` if `source` or `name` is blank, otherwise any
    /// credential or remote failure.
    #[instrument(skip(self))]
    pub async fn create_theme(
        &self,
        shop: &str,
        source: &str,
        name: &str,
    ) -> Result<Theme, DeployError> {
        let source = require("source", source)?;
        let name = require("name", name)?;

        let credential = self.resolver.resolve(shop).await?;
        let theme = self.gateway.create_theme(&credential, source, name).await?;

        tracing::info!(theme_id = %theme.id, "Theme created");
        Ok(theme)
    }

    /// Rename a theme.
    ///
    /// # Errors
    ///
    /// `DeployError::Input` if `name` is blank, otherwise any credential or
    /// remote failure.
    #[instrument(skip(self, theme_id), fields(theme_id = %theme_id))]
    pub async fn update_theme_name(
        &self,
        shop: &str,
        theme_id: ThemeId,
        name: &str,
    ) -> Result<Theme, DeployError> {
        let name = require("name", name)?;

        let credential = self.resolver.resolve(shop).await?;
        self.gateway
            .update_theme_name(&credential, theme_id, name)
            .await
    }

    /// Write file contents into an existing theme.
    ///
    /// # Errors
    ///
    /// `DeployError::Input` if `files` is empty or any file lacks a filename
    /// or content, otherwise any credential or remote failure.
    #[instrument(skip(self, theme_id, files), fields(theme_id = %theme_id, files = files.len()))]
    pub async fn upsert_theme_files(
        &self,
        shop: &str,
        theme_id: ThemeId,
        files: &[ThemeFileInput],
    ) -> Result<Vec<String>, DeployError> {
        if files.is_empty() {
            return Err(DeployError::Input(
                "files must contain at least one file".to_string(),
            ));
        }
        for (index, file) in files.iter().enumerate() {
            file.validate(index)?;
        }

        let credential = self.resolver.resolve(shop).await?;
        let upserted = self
            .gateway
            .upsert_theme_files(&credential, theme_id, files)
            .await?;

        tracing::info!(upserted = upserted.len(), "Theme files upserted");
        Ok(upserted)
    }

    /// Delete a theme, returning its global ID.
    ///
    /// # Errors
    ///
    /// Any credential or remote failure.
    #[instrument(skip(self, theme_id), fields(theme_id = %theme_id))]
    pub async fn delete_theme(&self, shop: &str, theme_id: ThemeId) -> Result<String, DeployError> {
        let credential = self.resolver.resolve(shop).await?;
        let deleted = self.gateway.delete_theme(&credential, theme_id).await?;

        tracing::info!(%deleted, "Theme deleted");
        Ok(deleted)
    }

    /// Read whether the platform is still processing a theme.
    ///
    /// # Errors
    ///
    /// Any credential or remote failure. Callers reporting status should use
    /// [`ThemeStatus::unknown`] so a failure never reads as `false`.
    #[instrument(skip(self, theme_id), fields(theme_id = %theme_id))]
    pub async fn theme_status(
        &self,
        shop: &str,
        theme_id: ThemeId,
    ) -> Result<ThemeProcessing, DeployError> {
        let credential = self.resolver.resolve(shop).await?;
        self.gateway.theme_processing(&credential, theme_id).await
    }
}

fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, DeployError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DeployError::Input(format!("{field} is required")));
    }
    Ok(trimmed)
}

/// Status response: `processing` is `null` only when the status is unknown
/// because of an error, never as a business state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeStatus {
    pub processing: Option<bool>,
    pub processing_failed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ThemeStatus {
    /// An authoritative answer from the platform.
    #[must_use]
    pub const fn known(processing: ThemeProcessing) -> Self {
        Self {
            processing: Some(processing.processing),
            processing_failed: processing.processing_failed,
            error: None,
        }
    }

    /// Status could not be determined.
    #[must_use]
    pub fn unknown(err: &DeployError) -> Self {
        Self {
            processing: None,
            processing_failed: None,
            error: Some(err.to_string()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use themedrop_core::StoreDomain;

    use super::*;

    #[test]
    fn test_require_trims() {
        assert_eq!(require("name", "  Spring ").unwrap(), "Spring");
        assert!(matches!(require("name", "   "), Err(DeployError::Input(m)) if m == "name is required"));
    }

    #[test]
    fn test_unknown_status_serializes_null_processing() {
        let err = DeployError::NotInstalled(StoreDomain::parse("shop.myshopify.com").unwrap());
        let json = serde_json::to_value(ThemeStatus::unknown(&err)).unwrap();
        assert!(json["processing"].is_null());
        assert!(json["processingFailed"].is_null());
        assert!(json["error"].as_str().unwrap().starts_with("No session found"));
    }

    #[test]
    fn test_known_status_serializes_false() {
        let status = ThemeStatus::known(ThemeProcessing {
            processing: false,
            processing_failed: Some(false),
        });
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["processing"], false);
        assert_eq!(json["processingFailed"], false);
        assert!(json.get("error").is_none());
    }
}
