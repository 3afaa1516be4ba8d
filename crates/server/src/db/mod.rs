//! `PostgreSQL` persistence.
//!
//! ## Tables
//!
//! - `stores` - Connected Shopify stores and their offline access tokens
//! - `ga4_connections` - GA4 OAuth tokens per store
//! - `test_results` - Saved checkout test reports (JSONB payload)
//! - `tower_sessions.session` - Session storage (OAuth CSRF state)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p ghost-cro-cli -- migrate
//! ```

pub mod ga4;
pub mod stores;
pub mod test_results;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use ga4::{Ga4Connection, Ga4ConnectionRepository};
pub use stores::{Store, StoreRepository};
pub use test_results::{TestResultRepository, TestResultSummary};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,
}

/// Create a `PostgreSQL` connection pool.
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
