//! Staged uploads: get a one-time target, then POST the bytes to it.
//!
//! The pipeline is a typestate. [`StagedUpload<Pending>`] can only be staged,
//! [`StagedUpload<Staged>`] can only be transferred, and both transitions
//! consume `self`. A staged target therefore cannot be transferred twice, and
//! nothing retries between the two steps.
//!
//! ```rust,ignore
//! let resource_url = StagedUpload::new(&gateway, &credential, artifact)
//!     .stage()
//!     .await?
//!     .transfer()
//!     .await?;
//! ```

use reqwest::multipart::{Form, Part};
use tracing::instrument;

use crate::db::StoreCredential;
use crate::error::{DeployError, describe_error};

use super::types::{StagedTarget, StagedUploadsCreatePayload};
use super::{AdminGateway, queries};

/// Multipart field name for the file bytes. Must be the last field.
pub const FILE_FIELD: &str = "file";

/// Filename used when the caller gives none.
pub const DEFAULT_FILENAME: &str = "theme.zip";

/// MIME type used when the caller gives none.
pub const DEFAULT_MIME_TYPE: &str = "application/zip";

/// A binary payload to upload.
#[derive(Clone)]
pub struct Artifact {
    bytes: Vec<u8>,
    filename: String,
    mime_type: String,
}

impl Artifact {
    /// Build an artifact, defaulting the filename and MIME type.
    ///
    /// # Errors
    ///
    /// Returns `DeployError::Input` if the payload is empty or the MIME type
    /// does not parse as `type/subtype` with optional parameters.
    pub fn new(
        bytes: Vec<u8>,
        filename: Option<String>,
        mime_type: Option<String>,
    ) -> Result<Self, DeployError> {
        if bytes.is_empty() {
            return Err(DeployError::Input("fileData cannot be empty".to_string()));
        }

        let filename = filename
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

        let mime_type = mime_type
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

        validate_mime_type(&mime_type)?;

        Ok(Self {
            bytes,
            filename,
            mime_type,
        })
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Artifact")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Accepts exactly what [`build_form`] accepts.
fn validate_mime_type(value: &str) -> Result<(), DeployError> {
    let essence = value.split(';').next().unwrap_or_default().trim();
    let well_formed = essence
        .split_once('/')
        .is_some_and(|(kind, sub)| !kind.is_empty() && !sub.is_empty());

    if !well_formed || Part::bytes(Vec::new()).mime_str(value).is_err() {
        return Err(DeployError::Input(format!(
            "mimeType must look like type/subtype, got {value:?}"
        )));
    }
    Ok(())
}

/// Nothing requested yet.
#[derive(Debug)]
pub struct Pending {
    artifact: Artifact,
}

/// A target has been issued and not yet used.
#[derive(Debug)]
pub struct Staged {
    artifact: Artifact,
    target: StagedTarget,
}

/// A staged upload in state `S`.
pub struct StagedUpload<'a, S> {
    gateway: &'a AdminGateway,
    credential: &'a StoreCredential,
    state: S,
}

impl<'a> StagedUpload<'a, Pending> {
    #[must_use]
    pub const fn new(
        gateway: &'a AdminGateway,
        credential: &'a StoreCredential,
        artifact: Artifact,
    ) -> Self {
        Self {
            gateway,
            credential,
            state: Pending { artifact },
        }
    }

    /// Ask the platform for one `FILE` upload target sized to the artifact.
    ///
    /// # Errors
    ///
    /// Any gateway failure, `DeployError::NoStagedTarget` when the platform
    /// returns an empty target list, or `DeployError::Unknown` when the
    /// target is malformed.
    #[instrument(skip_all, fields(shop = %self.credential.shop, filename = %self.state.artifact.filename, size = self.state.artifact.len()))]
    pub async fn stage(self) -> Result<StagedUpload<'a, Staged>, DeployError> {
        let Pending { artifact } = self.state;

        let request =
            queries::staged_uploads_create(&artifact.filename, &artifact.mime_type, artifact.len());
        let root = self.gateway.send(self.credential, &request).await.into_result()?;

        let payload: StagedUploadsCreatePayload = serde_json::from_value(root)
            .map_err(|e| DeployError::Unknown(format!("Unexpected stagedUploadsCreate payload: {e}")))?;

        let target = payload
            .staged_targets
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(DeployError::NoStagedTarget)?;

        let (Some(upload_url), Some(resource_url)) = (target.url, target.resource_url) else {
            return Err(DeployError::Unknown(
                "Staged target is missing url or resourceUrl".to_string(),
            ));
        };

        tracing::info!(%resource_url, "Staged upload target issued");

        Ok(StagedUpload {
            gateway: self.gateway,
            credential: self.credential,
            state: Staged {
                artifact,
                target: StagedTarget {
                    resource_url,
                    upload_url,
                    parameters: target
                        .parameters
                        .into_iter()
                        .map(|p| (p.name, p.value))
                        .collect(),
                },
            },
        })
    }
}

impl StagedUpload<'_, Staged> {
    /// The issued target.
    #[must_use]
    pub const fn target(&self) -> &StagedTarget {
        &self.state.target
    }

    /// POST the artifact to the target and return its `resourceUrl`.
    ///
    /// The form carries every staging parameter in the order issued, then
    /// the file under [`FILE_FIELD`]. The platform credential is not sent;
    /// the parameters pre-authorize the upload.
    ///
    /// # Errors
    ///
    /// `DeployError::Transport` for network failures or any non-2xx
    /// response (carrying the response body).
    #[instrument(skip_all, fields(shop = %self.credential.shop, upload_url = %self.state.target.upload_url))]
    pub async fn transfer(self) -> Result<String, DeployError> {
        let Staged { artifact, target } = self.state;

        let form = build_form(target.parameters, artifact)?;

        let response = self
            .gateway
            .http()
            .post(&target.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("failed to read response body: {}", describe_error(&e)),
            };
            tracing::warn!(status = status.as_u16(), "Staged upload transfer rejected");
            return Err(DeployError::Transport {
                status: Some(status.as_u16()),
                body,
            });
        }

        tracing::info!(resource_url = %target.resource_url, "Staged upload transferred");
        Ok(target.resource_url)
    }
}

fn build_form(parameters: Vec<(String, String)>, artifact: Artifact) -> Result<Form, DeployError> {
    let form = parameters
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value));

    let file = Part::bytes(artifact.bytes)
        .file_name(artifact.filename)
        .mime_str(&artifact.mime_type)
        .map_err(|e| DeployError::Unknown(format!("Invalid MIME type: {e}")))?;

    Ok(form.part(FILE_FIELD, file))
}

impl AdminGateway {
    /// Stage `artifact` and transfer it, returning the `resourceUrl`.
    ///
    /// Each call requests a fresh target; targets are never reused.
    ///
    /// # Errors
    ///
    /// See [`StagedUpload::stage`] and [`StagedUpload::transfer`].
    pub async fn upload_artifact(
        &self,
        credential: &StoreCredential,
        artifact: Artifact,
    ) -> Result<String, DeployError> {
        StagedUpload::new(self, credential, artifact)
            .stage()
            .await?
            .transfer()
            .await
    }
}
