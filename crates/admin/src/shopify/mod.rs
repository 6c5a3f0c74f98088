//! Shopify Admin API client for theme deployment (HIGH PRIVILEGE).
//!
//! # Security
//!
//! **Every call here carries a shop's Admin API access token.**
//!
//! Tokens are never configured on the client. They are resolved per call
//! from the session store and passed in explicitly, so one client serves any
//! number of shops and nothing token-related outlives a single request.
//!
//! # Architecture
//!
//! - [`AdminGateway`] sends one GraphQL document and classifies the outcome
//!   into a [`RemoteResult`]
//! - [`staged`] runs the two-step staged upload (stage, then multipart POST)
//! - Theme mutations and the status query live in `themes`
//! - No retries anywhere; staged targets are single-use
//!
//! # Example
//!
//! ```rust,ignore
//! use themedrop_admin::shopify::AdminGateway;
//!
//! let gateway = AdminGateway::new(&config.shopify)?;
//!
//! // Create a theme from a previously staged archive
//! let theme = gateway
//!     .create_theme(&credential, "https://shopify-staged-uploads...", "Spring")
//!     .await?;
//! ```

mod gateway;
pub mod queries;
pub mod staged;
mod themes;
pub mod types;

pub use gateway::{AdminGateway, RemoteRequest, classify_response};
pub use staged::{Artifact, Pending, Staged, StagedUpload};
pub use types::*;

use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// Outcome of a single call to the platform.
///
/// The variants are ordered by precedence: a transport failure hides any API
/// failure, which in turn hides any domain failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteResult<T> {
    /// The call succeeded.
    Ok(T),
    /// No usable HTTP response: network error, timeout, non-2xx status, or
    /// a body that is not JSON.
    TransportFailure {
        /// HTTP status, absent when no response was received.
        status: Option<u16>,
        /// Raw response body, or the cause when there was no response.
        body: String,
    },
    /// The GraphQL envelope reported an error, or the expected root field
    /// was missing.
    ApiFailure(String),
    /// The root field carried a non-empty `userErrors` list.
    DomainFailure(Vec<UserError>),
}

impl<T> RemoteResult<T> {
    /// Transform the success value, keeping failures untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RemoteResult<U> {
        match self {
            Self::Ok(value) => RemoteResult::Ok(f(value)),
            Self::TransportFailure { status, body } => {
                RemoteResult::TransportFailure { status, body }
            }
            Self::ApiFailure(message) => RemoteResult::ApiFailure(message),
            Self::DomainFailure(errors) => RemoteResult::DomainFailure(errors),
        }
    }

    /// Convert into the operation-level error vocabulary.
    ///
    /// # Errors
    ///
    /// Each failure variant maps onto its [`DeployError`] counterpart.
    pub fn into_result(self) -> Result<T, DeployError> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::TransportFailure { status, body } => Err(DeployError::Transport { status, body }),
            Self::ApiFailure(message) => Err(DeployError::Api(message)),
            Self::DomainFailure(errors) => Err(DeployError::Domain(errors)),
        }
    }

    /// Whether this is the success variant.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }
}

/// A field-scoped validation error returned in a mutation's `userErrors`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    /// Path to the offending input field, when the platform names one.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Human-readable message.
    pub message: String,
}

impl UserError {
    /// Create a user error.
    #[must_use]
    pub fn new(field: Option<Vec<String>>, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.field.as_deref() {
            Some(field) if !field.is_empty() => write!(f, "{}: {}", field.join("."), self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// Join user errors into one line for logs and display.
#[must_use]
pub fn summarize_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_error_display() {
        let with_field = UserError::new(
            Some(vec!["files".to_string(), "0".to_string(), "filename".to_string()]),
            "is invalid",
        );
        assert_eq!(with_field.to_string(), "files.0.filename: is invalid");

        let without_field = UserError::new(None, "Theme limit reached");
        assert_eq!(without_field.to_string(), "Theme limit reached");

        let empty_field = UserError::new(Some(vec![]), "Oops");
        assert_eq!(empty_field.to_string(), "Oops");
    }

    #[test]
    fn test_summarize_user_errors() {
        let errors = vec![
            UserError::new(Some(vec!["name".to_string()]), "is too long"),
            UserError::new(None, "Theme limit reached"),
        ];
        assert_eq!(
            summarize_user_errors(&errors),
            "name: is too long; Theme limit reached"
        );
    }

    #[test]
    fn test_map_keeps_failures() {
        let failed: RemoteResult<i32> = RemoteResult::ApiFailure("nope".to_string());
        assert_eq!(failed.map(|v| v + 1), RemoteResult::ApiFailure("nope".to_string()));

        let ok: RemoteResult<i32> = RemoteResult::Ok(1);
        assert_eq!(ok.map(|v| v + 1), RemoteResult::Ok(2));
    }

    #[test]
    fn test_into_result_maps_each_variant() {
        assert!(matches!(RemoteResult::Ok(1).into_result(), Ok(1)));
        assert!(matches!(
            RemoteResult::<()>::TransportFailure {
                status: Some(500),
                body: "x".to_string()
            }
            .into_result(),
            Err(DeployError::Transport {
                status: Some(500),
                ..
            })
        ));
        assert!(matches!(
            RemoteResult::<()>::ApiFailure("x".to_string()).into_result(),
            Err(DeployError::Api(_))
        ));
        assert!(matches!(
            RemoteResult::<()>::DomainFailure(vec![UserError::new(None, "x")]).into_result(),
            Err(DeployError::Domain(errors)) if errors.len() == 1
        ));
    }
}
