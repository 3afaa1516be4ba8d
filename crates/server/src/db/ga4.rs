//! GA4 OAuth connection repository.
//!
//! Tokens are written by the external connect flow; this service only reads
//! them and stores refreshed access tokens.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::PgPool;

use ghost_cro_core::ShopDomain;

use super::RepositoryError;

/// Stored Google OAuth tokens for a store's GA4 property.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone)]
pub struct Ga4Connection {
    pub shop: String,
    pub property_id: String,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Ga4Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ga4Connection")
            .field("shop", &self.shop)
            .field("property_id", &self.property_id)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Ga4Connection {
    /// Whether the access token expires within `margin_secs`.
    #[must_use]
    pub fn expires_within(&self, margin_secs: i64, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at <= now + chrono::Duration::seconds(margin_secs))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct Ga4ConnectionRow {
    shop: String,
    property_id: String,
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<Ga4ConnectionRow> for Ga4Connection {
    fn from(row: Ga4ConnectionRow) -> Self {
        Self {
            shop: row.shop,
            property_id: row.property_id,
            access_token: SecretString::from(row.access_token),
            refresh_token: row.refresh_token.map(SecretString::from),
            expires_at: row.expires_at,
        }
    }
}

/// Repository for GA4 connections.
pub struct Ga4ConnectionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> Ga4ConnectionRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection for a store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, shop: &ShopDomain) -> Result<Option<Ga4Connection>, RepositoryError> {
        let row = sqlx::query_as::<_, Ga4ConnectionRow>(
            r"
            SELECT shop, property_id, access_token, refresh_token, expires_at
            FROM ga4_connections
            WHERE shop = $1
            ",
        )
        .bind(shop.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Ga4Connection::from))
    }

    /// Store a refreshed access token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store has no connection.
    pub async fn update_access_token(
        &self,
        shop: &str,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE ga4_connections
            SET access_token = $2, expires_at = $3, updated_at = NOW()
            WHERE shop = $1
            ",
        )
        .bind(shop)
        .bind(access_token)
        .bind(expires_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(expires_at: Option<DateTime<Utc>>) -> Ga4Connection {
        Ga4Connection {
            shop: "acme.myshopify.com".to_string(),
            property_id: "123456".to_string(),
            access_token: SecretString::from("ya29.token"),
            refresh_token: Some(SecretString::from("1//refresh")),
            expires_at,
        }
    }

    #[test]
    fn expiry_margin() {
        let now = Utc::now();
        assert!(connection(Some(now + chrono::Duration::seconds(30))).expires_within(60, now));
        assert!(!connection(Some(now + chrono::Duration::seconds(600))).expires_within(60, now));
        assert!(!connection(None).expires_within(60, now));
    }

    #[test]
    fn debug_redacts_tokens() {
        let out = format!("{:?}", connection(None));
        assert!(!out.contains("ya29.token"));
        assert!(!out.contains("1//refresh"));
        assert!(out.contains("123456"));
    }
}
