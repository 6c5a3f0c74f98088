//! Integration test harness for Themedrop.
//!
//! Tests run the real gateway, deployer and router against two in-process
//! fakes:
//!
//! - [`MemoryCredentialStore`] stands in for the Postgres session table
//! - [`StubPlatform`] is an axum server on `127.0.0.1:0` that answers the
//!   Admin GraphQL endpoint from scripted replies, accepts staged multipart
//!   uploads, and records every request it sees
//!
//! No database or network access is needed:
//!
//! ```bash
//! cargo test -p themedrop-integration-tests
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use themedrop_admin::config::ShopifyAdminConfig;
use themedrop_admin::db::{CredentialStore, RepositoryError, StoreCredential};
use themedrop_admin::routes;
use themedrop_admin::services::{CredentialResolver, ThemeDeployer};
use themedrop_admin::shopify::AdminGateway;
use themedrop_admin::state::AppState;
use themedrop_core::StoreDomain;

/// Shop used by most tests.
pub const SHOP: &str = "demo-store.myshopify.com";

/// Token stored for [`SHOP`].
pub const TOKEN: &str = "shpat_test_token";

// =============================================================================
// Credential store
// =============================================================================

/// In-memory [`CredentialStore`] that counts lookups.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credentials: Mutex<HashMap<StoreDomain, StoreCredential>>,
    lookups: Mutex<usize>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding a valid, non-expiring credential for [`SHOP`].
    #[must_use]
    pub fn with_valid_shop() -> Self {
        let store = Self::new();
        store.insert(credential(SHOP, TOKEN, None));
        store
    }

    /// A store holding a credential for [`SHOP`] that expired an hour ago.
    #[must_use]
    pub fn with_expired_shop() -> Self {
        let store = Self::new();
        store.insert(credential(
            SHOP,
            TOKEN,
            Some(Utc::now() - Duration::hours(1)),
        ));
        store
    }

    pub fn insert(&self, credential: StoreCredential) {
        self.credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(credential.shop.clone(), credential);
    }

    /// Number of lookups served so far.
    #[must_use]
    pub fn lookups(&self) -> usize {
        *self.lookups.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn latest_offline(
        &self,
        shop: &StoreDomain,
    ) -> Result<Option<StoreCredential>, RepositoryError> {
        *self.lookups.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(self
            .credentials
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(shop)
            .cloned())
    }
}

/// Build a credential for `shop`.
///
/// # Panics
///
/// Panics if `shop` is not a valid store domain.
#[must_use]
#[allow(clippy::expect_used)]
pub fn credential(shop: &str, token: &str, expires_at: Option<DateTime<Utc>>) -> StoreCredential {
    StoreCredential {
        shop: StoreDomain::parse(shop).expect("valid shop domain"),
        access_token: SecretString::from(token.to_owned()),
        expires_at,
        scopes: vec!["write_themes".to_string()],
    }
}

// =============================================================================
// Stub platform
// =============================================================================

/// A request received by the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    /// A GraphQL call to the Admin endpoint.
    Graphql {
        operation: String,
        variables: Value,
        access_token: Option<String>,
    },
    /// A multipart POST to the staged upload URL.
    Upload {
        /// Field names in the order they arrived.
        fields: Vec<String>,
        /// Text field values by name.
        values: HashMap<String, String>,
        file_name: Option<String>,
        content_type: Option<String>,
        file: Vec<u8>,
        access_token: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct Reply {
    status: u16,
    body: String,
    delay: Option<StdDuration>,
}

#[derive(Default)]
struct StubState {
    graphql: HashMap<String, Reply>,
    upload: Option<Reply>,
    requests: Vec<Recorded>,
}

type Shared = Arc<Mutex<StubState>>;

/// Fake Admin API. Shuts down when dropped.
pub struct StubPlatform {
    addr: SocketAddr,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubPlatform {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state: Shared = Arc::default();
        let app = Router::new()
            .route("/admin/api/{version}/graphql.json", post(graphql))
            .route("/upload", post(upload))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub platform");
        let addr = listener.local_addr().expect("stub platform address");

        let (shutdown, signal) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await;
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown),
        }
    }

    /// Origin to configure as the Admin API override.
    #[must_use]
    pub fn origin(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// URL the stub accepts staged uploads on.
    #[must_use]
    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.origin())
    }

    /// Answer `operation` with `status` and a JSON body.
    pub fn respond(&self, operation: &str, status: u16, body: &Value) {
        self.respond_raw(operation, status, &body.to_string());
    }

    /// Answer `operation` with `status` and a raw body.
    pub fn respond_raw(&self, operation: &str, status: u16, body: &str) {
        self.lock().graphql.insert(
            operation.to_owned(),
            Reply {
                status,
                body: body.to_owned(),
                delay: None,
            },
        );
    }

    /// Answer `operation` with `body`, but only after `delay`.
    pub fn respond_after(&self, operation: &str, delay: StdDuration, body: &Value) {
        self.lock().graphql.insert(
            operation.to_owned(),
            Reply {
                status: 200,
                body: body.to_string(),
                delay: Some(delay),
            },
        );
    }

    /// Answer `operation` with `{"data": {root: payload}}`.
    pub fn respond_data(&self, operation: &str, root: &str, payload: Value) {
        self.respond(operation, 200, &json!({"data": {root: payload}}));
    }

    /// Answer staged uploads with `status` and `body`. Defaults to 204.
    pub fn respond_upload(&self, status: u16, body: &str) {
        self.lock().upload = Some(Reply {
            status,
            body: body.to_owned(),
            delay: None,
        });
    }

    /// Script a successful `stagedUploadsCreate` pointing at this stub.
    pub fn stage_target(&self, resource_url: &str, parameters: &[(&str, &str)]) {
        self.stage_target_at(&self.upload_url(), resource_url, parameters);
    }

    /// Script a successful `stagedUploadsCreate` whose upload URL is
    /// `upload_url`.
    pub fn stage_target_at(&self, upload_url: &str, resource_url: &str, parameters: &[(&str, &str)]) {
        let parameters: Vec<Value> = parameters
            .iter()
            .map(|(name, value)| json!({"name": name, "value": value}))
            .collect();
        self.respond_data(
            "StagedUploadsCreate",
            "stagedUploadsCreate",
            json!({
                "stagedTargets": [{
                    "url": upload_url,
                    "resourceUrl": resource_url,
                    "parameters": parameters,
                }],
                "userErrors": [],
            }),
        );
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<Recorded> {
        self.lock().requests.clone()
    }

    /// GraphQL operation names received so far.
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                Recorded::Graphql { operation, .. } => Some(operation),
                Recorded::Upload { .. } => None,
            })
            .collect()
    }

    /// Number of multipart uploads received so far.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| matches!(r, Recorded::Upload { .. }))
            .count()
    }

    /// Gateway configured against this stub.
    #[must_use]
    pub fn gateway(&self) -> AdminGateway {
        gateway_for(&self.origin(), None)
    }

    /// Gateway against this stub that gives up after `timeout`.
    #[must_use]
    pub fn gateway_with_timeout(&self, timeout: StdDuration) -> AdminGateway {
        gateway_for(&self.origin(), Some(timeout))
    }

    /// Deployer backed by `store` and this stub.
    #[must_use]
    pub fn deployer(&self, store: Arc<MemoryCredentialStore>) -> ThemeDeployer {
        deployer_with(store, self.gateway())
    }

    /// The full application router backed by `store` and this stub.
    #[must_use]
    pub fn app(&self, store: Arc<MemoryCredentialStore>) -> Router {
        app_with(self.deployer(store))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Gateway against an arbitrary Admin origin.
///
/// # Panics
///
/// Panics if the HTTP client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn gateway_for(origin: &str, timeout: Option<StdDuration>) -> AdminGateway {
    AdminGateway::new(&ShopifyAdminConfig {
        admin_origin: Some(origin.to_owned()),
        request_timeout: timeout,
        ..ShopifyAdminConfig::default()
    })
    .expect("build gateway")
}

/// Deployer backed by `store` and `gateway`.
#[must_use]
pub fn deployer_with(store: Arc<MemoryCredentialStore>, gateway: AdminGateway) -> ThemeDeployer {
    ThemeDeployer::new(CredentialResolver::new(store), gateway)
}

/// The full application router around `deployer`.
#[must_use]
pub fn app_with(deployer: ThemeDeployer) -> Router {
    routes::router(AppState::without_database(deployer))
}

/// An `http://` origin on a local port nothing listens on.
///
/// # Panics
///
/// Panics if a probe listener cannot be bound.
#[allow(clippy::expect_used)]
pub async fn closed_origin() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway listener address");
    drop(listener);
    format!("http://{addr}")
}

impl Drop for StubPlatform {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

fn access_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Shopify-Access-Token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

fn reply(reply: Option<Reply>, fallback: Reply) -> Response {
    let reply = reply.unwrap_or(fallback);
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, reply.body).into_response()
}

async fn graphql(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let operation = body["operationName"].as_str().unwrap_or_default().to_owned();
    let scripted = {
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        state.requests.push(Recorded::Graphql {
            operation: operation.clone(),
            variables: body["variables"].clone(),
            access_token: access_token(&headers),
        });
        state.graphql.get(&operation).cloned()
    };

    if let Some(delay) = scripted.as_ref().and_then(|r| r.delay) {
        tokio::time::sleep(delay).await;
    }

    reply(
        scripted,
        Reply {
            status: 500,
            body: format!("no reply scripted for {operation}"),
            delay: None,
        },
    )
}

async fn upload(State(state): State<Shared>, headers: HeaderMap, mut multipart: Multipart) -> Response {
    let mut fields = Vec::new();
    let mut values = HashMap::new();
    let mut file_name = None;
    let mut content_type = None;
    let mut file = Vec::new();

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_owned();
        if field.file_name().is_some() {
            file_name = field.file_name().map(str::to_owned);
            content_type = field.content_type().map(str::to_owned);
            file = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        } else {
            let value = field.text().await.unwrap_or_default();
            values.insert(name.clone(), value);
        }
        fields.push(name);
    }

    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
    state.requests.push(Recorded::Upload {
        fields,
        values,
        file_name,
        content_type,
        file,
        access_token: access_token(&headers),
    });
    let scripted = state.upload.clone();
    drop(state);

    reply(
        scripted,
        Reply {
            status: 204,
            body: String::new(),
            delay: None,
        },
    )
}
