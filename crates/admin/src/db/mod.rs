//! Database access for the shop session store.
//!
//! # Database
//!
//! The `shopify_sessions` table is owned by the app-installation flow, which
//! writes one row per OAuth grant. Themedrop only ever reads it.
//!
//! ## Tables
//!
//! - `shopify_sessions` - Per-shop access tokens (online and offline)
//!
//! # Migrations
//!
//! The expected table shape lives in `crates/admin/migrations/`. Set
//! `THEMEDROP_RUN_MIGRATIONS=true` to apply it on startup, or run it from the
//! installation flow's deployment:
//! ```bash
//! sqlx migrate run --source crates/admin/migrations
//! ```

pub mod sessions;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use themedrop_core::StoreDomain;

pub use sessions::{SessionRepository, StoreCredential};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Read access to stored per-shop credentials.
///
/// Implementations must not cache: installs and reinstalls replace
/// credentials at any time, so every lookup goes to the source of truth.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// The longest-lived offline credential for `shop`, if any.
    ///
    /// Expired credentials are returned as-is; the caller decides what an
    /// expired credential means.
    async fn latest_offline(
        &self,
        shop: &StoreDomain,
    ) -> Result<Option<StoreCredential>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply the migrations bundled with this crate.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
