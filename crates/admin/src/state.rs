//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::services::ThemeDeployer;

/// Application state shared across all handlers.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    deployer: ThemeDeployer,
    pool: Option<PgPool>,
}

impl AppState {
    /// State backed by a database pool, which the readiness probe checks.
    #[must_use]
    pub fn new(deployer: ThemeDeployer, pool: PgPool) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                deployer,
                pool: Some(pool),
            }),
        }
    }

    /// State whose credentials come from somewhere other than Postgres.
    #[must_use]
    pub fn without_database(deployer: ThemeDeployer) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                deployer,
                pool: None,
            }),
        }
    }

    #[must_use]
    pub fn deployer(&self) -> &ThemeDeployer {
        &self.inner.deployer
    }

    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }
}
