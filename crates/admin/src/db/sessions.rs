//! Shopify session repository for credential lookups.
//!
//! Reads offline access tokens written by the app-installation flow.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::PgPool;
use themedrop_core::StoreDomain;

use super::{CredentialStore, RepositoryError};

// =============================================================================
// Types
// =============================================================================

/// A stored access credential for one shop.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct StoreCredential {
    /// Canonical shop domain.
    pub shop: StoreDomain,
    /// Admin API access token (HIGH PRIVILEGE - redacted in debug output).
    pub access_token: SecretString,
    /// When the token stops being valid; `None` for non-expiring tokens.
    pub expires_at: Option<DateTime<Utc>>,
    /// Granted scopes.
    pub scopes: Vec<String>,
}

impl StoreCredential {
    /// Whether the credential has expired as of `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

impl std::fmt::Debug for StoreCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredential")
            .field("shop", &self.shop)
            .field("access_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Internal row type for `PostgreSQL` queries.
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    shop: String,
    access_token: String,
    scope: Option<String>,
    expires: Option<DateTime<Utc>>,
}

impl TryFrom<SessionRow> for StoreCredential {
    type Error = RepositoryError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let shop = StoreDomain::parse(&row.shop).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shop {:?}: {e}", row.shop))
        })?;

        let scopes = row
            .scope
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            shop,
            access_token: SecretString::from(row.access_token),
            expires_at: row.expires,
            scopes,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// `PostgreSQL`-backed credential store.
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for SessionRepository {
    /// Offline sessions only, longest-lived first. A NULL `expires` never
    /// expires, so it sorts ahead of any dated token.
    async fn latest_offline(
        &self,
        shop: &StoreDomain,
    ) -> Result<Option<StoreCredential>, RepositoryError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r"
            SELECT shop, access_token, scope, expires
            FROM shopify_sessions
            WHERE shop = $1 AND is_online = FALSE
            ORDER BY expires DESC NULLS FIRST
            LIMIT 1
            ",
        )
        .bind(shop.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(StoreCredential::try_from).transpose()
    }
}
