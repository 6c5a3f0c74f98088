//! Shopify Admin API types used by theme deployment.
//!
//! These are the decoded shapes of mutation and query payloads. Raw GraphQL
//! JSON is decoded into them right after classification, so an unexpected
//! payload shape surfaces as a single error instead of scattered `null`s.

use serde::{Deserialize, Serialize};

use themedrop_core::ThemeId;

/// A theme as returned by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// Global ID (e.g. `gid://shopify/OnlineStoreTheme/123`).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Theme role (`UNPUBLISHED`, `MAIN`, ...), when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Theme {
    /// The numeric id, when the global ID is a theme ID.
    #[must_use]
    pub fn theme_id(&self) -> Option<ThemeId> {
        ThemeId::parse(&self.id).ok()
    }
}

/// Processing state of a theme created from an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeProcessing {
    /// Whether the platform is still unpacking the archive.
    pub processing: bool,
    /// Whether unpacking failed.
    #[serde(default)]
    pub processing_failed: Option<bool>,
}

/// A one-time upload target issued by `stagedUploadsCreate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedTarget {
    /// Reference to pass as `source` when creating a theme.
    pub resource_url: String,
    /// Endpoint the multipart form is posted to.
    pub upload_url: String,
    /// Form fields that must precede the file field, in order.
    pub parameters: Vec<(String, String)>,
}

/// Wire shape of a staged target.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StagedTargetPayload {
    pub url: Option<String>,
    pub resource_url: Option<String>,
    #[serde(default)]
    pub parameters: Vec<StagedUploadParameter>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StagedUploadParameter {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StagedUploadsCreatePayload {
    pub staged_targets: Option<Vec<StagedTargetPayload>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThemePayload {
    pub theme: Option<Theme>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThemeDeletePayload {
    pub deleted_theme_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThemeFilesUpsertPayload {
    pub upserted_theme_files: Option<Vec<UpsertedThemeFile>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpsertedThemeFile {
    pub filename: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_id_from_gid() {
        let theme = Theme {
            id: "gid://shopify/OnlineStoreTheme/99".to_string(),
            name: "Dawn".to_string(),
            role: None,
        };
        assert_eq!(theme.theme_id(), Some(ThemeId::new(99)));
    }

    #[test]
    fn test_theme_serializes_without_missing_role() {
        let theme = Theme {
            id: "gid://shopify/OnlineStoreTheme/1".to_string(),
            name: "Dawn".to_string(),
            role: None,
        };
        let json = serde_json::to_value(&theme).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": "gid://shopify/OnlineStoreTheme/1", "name": "Dawn"})
        );
    }

    #[test]
    fn test_staged_payload_decodes() {
        let payload: StagedUploadsCreatePayload = serde_json::from_value(serde_json::json!({
            "stagedTargets": [{
                "url": "https://uploads.example/bucket",
                "resourceUrl": "https://uploads.example/bucket/key",
                "parameters": [{"name": "key", "value": "abc"}]
            }],
            "userErrors": []
        }))
        .unwrap();

        let targets = payload.staged_targets.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].parameters[0].name, "key");
    }
}
