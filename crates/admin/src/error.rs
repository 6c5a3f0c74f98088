//! Unified error handling for theme deployments.
//!
//! Every operation reports failures through [`DeployError`]. The variants
//! follow where the failure was caught: caller input, credential lookup, the
//! HTTP exchange, the GraphQL envelope, or the platform's own validation.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use themedrop_core::{StoreDomain, StoreDomainError, ThemeFileError, ThemeIdError};

use crate::db::RepositoryError;
use crate::shopify::{UserError, summarize_user_errors};

/// Failure of a deployment operation.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Missing or malformed caller input. Caught before any network call.
    #[error("{0}")]
    Input(String),

    /// The shop has no stored offline credential.
    #[error("No session found for shop {0}. Please install the app first.")]
    NotInstalled(StoreDomain),

    /// The shop's stored credential is past its expiry.
    #[error("Session expired for shop {0}. Please reinstall the app.")]
    Expired(StoreDomain),

    /// The HTTP exchange with the platform failed.
    #[error("{}", transport_message(.status, .body))]
    Transport {
        /// HTTP status, absent when no response was received.
        status: Option<u16>,
        /// Response body or the underlying cause.
        body: String,
    },

    /// The platform answered but reported a protocol-level error.
    #[error("{0}")]
    Api(String),

    /// The platform rejected the request with field-scoped errors.
    #[error("{}", summarize_user_errors(.0))]
    Domain(Vec<UserError>),

    /// The staging request succeeded but returned no upload target.
    #[error("No staged upload target returned")]
    NoStagedTarget,

    /// Anything not otherwise classified (e.g. unexpected payload shape).
    #[error("{0}")]
    Unknown(String),
}

#[allow(clippy::ref_option)]
fn transport_message(status: &Option<u16>, body: &str) -> String {
    match status {
        Some(status) => format!("Shopify responded with HTTP {status}: {body}"),
        None => format!("Request to Shopify failed: {body}"),
    }
}

impl DeployError {
    /// HTTP status reported to the caller.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Input(_) | Self::Domain(_) => StatusCode::BAD_REQUEST,
            Self::NotInstalled(_) => StatusCode::NOT_FOUND,
            Self::Expired(_) => StatusCode::UNAUTHORIZED,
            Self::Transport { .. } | Self::Api(_) | Self::NoStagedTarget | Self::Unknown(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Structured field errors, when the platform returned any.
    #[must_use]
    pub fn user_errors(&self) -> Option<&[UserError]> {
        match self {
            Self::Domain(errors) => Some(errors),
            _ => None,
        }
    }

    /// Whether this failure is on our side of the exchange rather than the
    /// caller's, and worth reporting to error tracking.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Api(_) | Self::NoStagedTarget | Self::Unknown(_)
        )
    }

    /// JSON body describing this failure.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            user_errors: self.user_errors().map(<[UserError]>::to_vec),
        }
    }
}

/// Error response body: a human summary, plus the structured field errors
/// when the platform returned them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_errors: Option<Vec<UserError>>,
}

impl From<StoreDomainError> for DeployError {
    fn from(err: StoreDomainError) -> Self {
        Self::Input(err.to_string())
    }
}

impl From<ThemeIdError> for DeployError {
    fn from(err: ThemeIdError) -> Self {
        Self::Input(err.to_string())
    }
}

impl From<ThemeFileError> for DeployError {
    fn from(err: ThemeFileError) -> Self {
        Self::Input(err.to_string())
    }
}

impl From<RepositoryError> for DeployError {
    fn from(err: RepositoryError) -> Self {
        Self::Unknown(format!("Session store error: {err}"))
    }
}

impl From<JsonRejection> for DeployError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Input(rejection.body_text())
    }
}

impl From<QueryRejection> for DeployError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Input(rejection.body_text())
    }
}

impl From<reqwest::Error> for DeployError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            body: describe_error(&err),
        }
    }
}

/// Flatten a reqwest error and its sources into one line.
pub(crate) fn describe_error(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Log server-side failures and report them to Sentry.
pub fn report(err: &DeployError) {
    if err.is_server_error() {
        let event_id = sentry::capture_error(err);
        tracing::error!(
            error = %err,
            sentry_event_id = %event_id,
            "Theme deployment error"
        );
    } else {
        tracing::warn!(error = %err, "Theme deployment rejected");
    }
}

impl IntoResponse for DeployError {
    fn into_response(self) -> Response {
        report(&self);
        (self.status_code(), Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shop() -> StoreDomain {
        StoreDomain::parse("shop.myshopify.com").unwrap()
    }

    #[test]
    fn test_credential_messages() {
        assert_eq!(
            DeployError::NotInstalled(shop()).to_string(),
            "No session found for shop shop.myshopify.com. Please install the app first."
        );
        assert_eq!(
            DeployError::Expired(shop()).to_string(),
            "Session expired for shop shop.myshopify.com. Please reinstall the app."
        );
    }

    #[test]
    fn test_transport_message_with_and_without_status() {
        let with_status = DeployError::Transport {
            status: Some(502),
            body: "Bad Gateway".to_string(),
        };
        assert_eq!(
            with_status.to_string(),
            "Shopify responded with HTTP 502: Bad Gateway"
        );

        let without_status = DeployError::Transport {
            status: None,
            body: "connection refused".to_string(),
        };
        assert_eq!(
            without_status.to_string(),
            "Request to Shopify failed: connection refused"
        );
    }

    #[test]
    fn test_status_codes() {
        fn get_status(err: DeployError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(DeployError::Input("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(DeployError::NotInstalled(shop())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(DeployError::Expired(shop())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(DeployError::Domain(vec![])),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(DeployError::Transport {
                status: Some(503),
                body: String::new()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(DeployError::Api("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(DeployError::NoStagedTarget),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(DeployError::Unknown("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_body_keeps_structured_errors() {
        let err = DeployError::Domain(vec![
            UserError::new(Some(vec!["name".to_string()]), "Name can't be blank"),
            UserError::new(None, "Theme limit reached"),
        ]);

        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(
            body["error"],
            "name: Name can't be blank; Theme limit reached"
        );
        assert_eq!(body["userErrors"][0]["field"][0], "name");
        assert_eq!(body["userErrors"][0]["message"], "Name can't be blank");
        assert!(body["userErrors"][1]["field"].is_null());
    }

    #[test]
    fn test_non_domain_body_omits_user_errors() {
        let body = serde_json::to_value(DeployError::Api("x".to_string()).to_body()).unwrap();
        assert!(body.get("userErrors").is_none());
    }
}
