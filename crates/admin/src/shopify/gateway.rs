//! Shopify Admin API GraphQL gateway.
//!
//! Sends one GraphQL document per call, authenticated with the credential
//! passed in, and folds every way the call can go wrong into a
//! [`RemoteResult`].

use std::sync::Arc;

use graphql_client::QueryBody;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use serde_json::Value;
use themedrop_core::StoreDomain;
use tracing::instrument;

use crate::config::ShopifyAdminConfig;
use crate::db::StoreCredential;
use crate::error::describe_error;

use super::queries::Operation;
use super::{RemoteResult, UserError};

/// Header carrying the shop's access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// One GraphQL call: document, variables, and the expected root field.
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    pub operation: Operation,
    pub variables: Value,
}

impl RemoteRequest {
    #[must_use]
    pub fn new(operation: Operation, variables: Value) -> Self {
        Self {
            operation,
            variables,
        }
    }

    /// The `{query, variables, operationName}` JSON body.
    #[must_use]
    pub fn body(&self) -> QueryBody<&Value> {
        QueryBody {
            variables: &self.variables,
            query: self.operation.document,
            operation_name: self.operation.name,
        }
    }
}

/// Shopify Admin API GraphQL gateway.
///
/// Cheap to clone; clones share one connection pool. Holds no credentials.
#[derive(Clone)]
pub struct AdminGateway {
    inner: Arc<AdminGatewayInner>,
}

struct AdminGatewayInner {
    client: reqwest::Client,
    api_version: String,
    admin_origin: Option<String>,
}

impl AdminGateway {
    /// Create a new gateway.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &ShopifyAdminConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(AdminGatewayInner {
                client: builder.build()?,
                api_version: config.api_version.clone(),
                admin_origin: config.admin_origin.clone(),
            }),
        })
    }

    /// The GraphQL endpoint for `shop`.
    #[must_use]
    pub fn endpoint(&self, shop: &StoreDomain) -> String {
        let origin = self
            .inner
            .admin_origin
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"));
        format!("{origin}/admin/api/{}/graphql.json", self.inner.api_version)
    }

    /// The underlying HTTP client, shared with staged transfers.
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Send one request and classify the outcome.
    ///
    /// Makes exactly one HTTP call and never retries.
    #[instrument(skip_all, fields(shop = %credential.shop, operation = request.operation.name))]
    pub async fn send(
        &self,
        credential: &StoreCredential,
        request: &RemoteRequest,
    ) -> RemoteResult<Value> {
        let endpoint = self.endpoint(&credential.shop);

        let response = match self
            .inner
            .client
            .post(&endpoint)
            .header(ACCESS_TOKEN_HEADER, credential.access_token.expose_secret())
            .header(CONTENT_TYPE, "application/json")
            .json(&request.body())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "Shopify request failed before a response");
                return RemoteResult::TransportFailure {
                    status: None,
                    body: describe_error(&e),
                };
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return RemoteResult::TransportFailure {
                    status: Some(status),
                    body: describe_error(&e),
                };
            }
        };

        let result = classify_response(status, &body, request.operation.root_field);
        if !result.is_ok() {
            tracing::warn!(status, "Shopify request did not succeed");
        }
        result
    }
}

/// Classify an HTTP response from the GraphQL endpoint.
///
/// Checks run in order and the first match wins: non-2xx status or non-JSON
/// body, top-level `errors`, missing or `null` root field, non-empty
/// `userErrors` on the root field. Otherwise the root field's value is
/// returned.
#[must_use]
pub fn classify_response(status: u16, body: &str, root_field: &str) -> RemoteResult<Value> {
    if !(200..300).contains(&status) {
        return RemoteResult::TransportFailure {
            status: Some(status),
            body: body.to_owned(),
        };
    }

    let Ok(envelope) = serde_json::from_str::<graphql_client::Response<Value>>(body) else {
        return RemoteResult::TransportFailure {
            status: Some(status),
            body: body.to_owned(),
        };
    };

    if let Some(first) = envelope.errors.as_deref().and_then(<[_]>::first) {
        return RemoteResult::ApiFailure(first.message.clone());
    }

    let root = envelope
        .data
        .and_then(|mut data| data.get_mut(root_field).map(Value::take))
        .filter(|value| !value.is_null());

    let Some(root) = root else {
        return RemoteResult::ApiFailure(format!("{root_field} missing in response"));
    };

    match root.get("userErrors") {
        Some(Value::Array(errors)) if !errors.is_empty() => {
            match serde_json::from_value::<Vec<UserError>>(Value::Array(errors.clone())) {
                Ok(errors) => RemoteResult::DomainFailure(errors),
                Err(e) => RemoteResult::ApiFailure(format!(
                    "{root_field}.userErrors has an unexpected shape: {e}"
                )),
            }
        }
        _ => RemoteResult::Ok(root),
    }
}
