//! Credential resolution for shop-scoped Admin API calls.
//!
//! Every operation starts here: the caller's shop reference is normalized,
//! the session store is asked for the longest-lived offline credential, and
//! an expired credential is refused before any network call is made.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use themedrop_core::StoreDomain;
use tracing::instrument;

use crate::db::{CredentialStore, StoreCredential};
use crate::error::DeployError;

/// Resolves shops to stored credentials.
///
/// Holds no cache; each call reads through to the store.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn CredentialStore>,
}

impl CredentialResolver {
    /// Create a resolver over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Resolve a raw shop reference (scheme, trailing slash and case are ignored).
    ///
    /// # Errors
    ///
    /// - `DeployError::Input` if the reference is not a hostname
    /// - `DeployError::NotInstalled` if no offline credential exists
    /// - `DeployError::Expired` if the credential is past its expiry
    /// - `DeployError::Unknown` if the store lookup fails
    pub async fn resolve(&self, shop: &str) -> Result<StoreCredential, DeployError> {
        let shop = StoreDomain::parse(shop)?;
        self.resolve_domain(&shop).await
    }

    /// Resolve an already-normalized shop.
    ///
    /// # Errors
    ///
    /// See [`CredentialResolver::resolve`].
    pub async fn resolve_domain(&self, shop: &StoreDomain) -> Result<StoreCredential, DeployError> {
        self.resolve_at(shop, Utc::now()).await
    }

    /// Resolve `shop` as of `now`.
    ///
    /// # Errors
    ///
    /// See [`CredentialResolver::resolve`].
    #[instrument(skip(self, now), fields(shop = %shop))]
    pub async fn resolve_at(
        &self,
        shop: &StoreDomain,
        now: DateTime<Utc>,
    ) -> Result<StoreCredential, DeployError> {
        let Some(credential) = self.store.latest_offline(shop).await? else {
            tracing::warn!("No offline session stored for shop");
            return Err(DeployError::NotInstalled(shop.clone()));
        };

        if credential.is_expired_at(now) {
            tracing::warn!(expires_at = ?credential.expires_at, "Offline session expired");
            return Err(DeployError::Expired(shop.clone()));
        }

        tracing::debug!("Resolved offline session");
        Ok(credential)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use chrono::Duration;
    use secrecy::{ExposeSecret, SecretString};

    use super::*;
    use crate::db::RepositoryError;

    struct FixedStore(HashMap<String, StoreCredential>);

    #[async_trait]
    impl CredentialStore for FixedStore {
        async fn latest_offline(
            &self,
            shop: &StoreDomain,
        ) -> Result<Option<StoreCredential>, RepositoryError> {
            Ok(self.0.get(shop.as_str()).cloned())
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn latest_offline(
            &self,
            _shop: &StoreDomain,
        ) -> Result<Option<StoreCredential>, RepositoryError> {
            Err(RepositoryError::DataCorruption("bad row".to_string()))
        }
    }

    fn credential(shop: &str, expires_at: Option<DateTime<Utc>>) -> StoreCredential {
        StoreCredential {
            shop: StoreDomain::parse(shop).unwrap(),
            access_token: SecretString::from(format!("token-for-{shop}")),
            expires_at,
            scopes: vec!["write_themes".to_string()],
        }
    }

    fn resolver(credentials: Vec<StoreCredential>) -> CredentialResolver {
        let map = credentials
            .into_iter()
            .map(|c| (c.shop.as_str().to_string(), c))
            .collect();
        CredentialResolver::new(Arc::new(FixedStore(map)))
    }

    #[tokio::test]
    async fn test_equivalent_references_resolve_to_same_credential() {
        let resolver = resolver(vec![credential("shop.myshopify.com", None)]);

        for reference in [
            "shop.myshopify.com",
            "https://shop.myshopify.com",
            "HTTPS://SHOP.myshopify.com/",
            "http://Shop.MyShopify.com//",
        ] {
            let resolved = resolver.resolve(reference).await.unwrap();
            assert_eq!(resolved.shop.as_str(), "shop.myshopify.com");
            assert_eq!(
                resolved.access_token.expose_secret(),
                "token-for-shop.myshopify.com"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_credential_is_not_installed() {
        let resolver = resolver(vec![]);
        let err = resolver.resolve("other.myshopify.com").await.unwrap_err();
        assert!(matches!(err, DeployError::NotInstalled(shop) if shop.as_str() == "other.myshopify.com"));
    }

    #[tokio::test]
    async fn test_expired_credential_is_refused() {
        let now = Utc::now();
        let resolver = resolver(vec![credential(
            "shop.myshopify.com",
            Some(now - Duration::minutes(5)),
        )]);

        let err = resolver
            .resolve_at(&StoreDomain::parse("shop.myshopify.com").unwrap(), now)
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Expired(_)));
    }

    #[tokio::test]
    async fn test_future_expiry_is_usable() {
        let now = Utc::now();
        let resolver = resolver(vec![credential(
            "shop.myshopify.com",
            Some(now + Duration::days(1)),
        )]);

        let resolved = resolver
            .resolve_at(&StoreDomain::parse("shop.myshopify.com").unwrap(), now)
            .await;
        assert!(resolved.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_reference_is_input_error() {
        let resolver = resolver(vec![]);
        let err = resolver.resolve("https://").await.unwrap_err();
        assert!(matches!(err, DeployError::Input(_)));
    }

    #[tokio::test]
    async fn test_store_failure_is_unknown() {
        let resolver = CredentialResolver::new(Arc::new(BrokenStore));
        let err = resolver.resolve("shop.myshopify.com").await.unwrap_err();
        assert!(matches!(err, DeployError::Unknown(_)));
    }
}
