//! Connected store repository.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use sqlx::PgPool;

use ghost_cro_core::ShopDomain;

use super::RepositoryError;

/// A Shopify store that installed the app.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct Store {
    pub shop: ShopDomain,
    /// Offline Admin API token; `None` once the app is uninstalled.
    pub access_token: Option<SecretString>,
    pub scopes: Vec<String>,
    pub plan_name: Option<String>,
    pub subscription_status: Option<String>,
    pub installed: bool,
    pub installed_at: DateTime<Utc>,
    pub uninstalled_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("shop", &self.shop)
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("scopes", &self.scopes)
            .field("plan_name", &self.plan_name)
            .field("subscription_status", &self.subscription_status)
            .field("installed", &self.installed)
            .field("installed_at", &self.installed_at)
            .field("uninstalled_at", &self.uninstalled_at)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    shop: String,
    access_token: Option<String>,
    scope: String,
    plan_name: Option<String>,
    subscription_status: Option<String>,
    installed: bool,
    installed_at: DateTime<Utc>,
    uninstalled_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreRow> for Store {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let shop = ShopDomain::parse(&row.shop).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid shop domain in database: {e}"))
        })?;

        Ok(Self {
            shop,
            access_token: row.access_token.map(SecretString::from),
            scopes: row
                .scope
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            plan_name: row.plan_name,
            subscription_status: row.subscription_status,
            installed: row.installed,
            installed_at: row.installed_at,
            uninstalled_at: row.uninstalled_at,
            updated_at: row.updated_at,
        })
    }
}

const STORE_COLUMNS: &str = "shop, access_token, scope, plan_name, subscription_status, \
                             installed, installed_at, uninstalled_at, updated_at";

/// Repository for connected stores.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StoreRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a fresh install or re-install, storing the new access token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_installation(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        scope: &str,
    ) -> Result<Store, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO stores (shop, access_token, scope, installed, installed_at, updated_at)
            VALUES ($1, $2, $3, TRUE, NOW(), NOW())
            ON CONFLICT (shop) DO UPDATE SET
                access_token = EXCLUDED.access_token,
                scope = EXCLUDED.scope,
                installed = TRUE,
                installed_at = CASE WHEN stores.installed THEN stores.installed_at ELSE NOW() END,
                uninstalled_at = NULL,
                updated_at = NOW()
            RETURNING {STORE_COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(shop.as_str())
            .bind(access_token)
            .bind(scope)
            .fetch_one(self.pool)
            .await?;

        row.try_into()
    }

    /// Get a store by shop domain.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored shop is invalid.
    pub async fn get_by_shop(&self, shop: &ShopDomain) -> Result<Option<Store>, RepositoryError> {
        let sql = format!("SELECT {STORE_COLUMNS} FROM stores WHERE shop = $1");

        let row = sqlx::query_as::<_, StoreRow>(&sql)
            .bind(shop.as_str())
            .fetch_optional(self.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Update the billing plan after an `app_subscriptions/update` webhook.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store is unknown.
    pub async fn update_subscription(
        &self,
        shop: &ShopDomain,
        plan_name: &str,
        status: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE stores
            SET plan_name = $2, subscription_status = $3, updated_at = NOW()
            WHERE shop = $1
            ",
        )
        .bind(shop.as_str())
        .bind(plan_name)
        .bind(status)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark a store uninstalled and drop its access token.
    ///
    /// Returns `false` when the store was not known.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_uninstalled(&self, shop: &ShopDomain) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE stores
            SET installed = FALSE,
                access_token = NULL,
                uninstalled_at = NOW(),
                updated_at = NOW()
            WHERE shop = $1
            ",
        )
        .bind(shop.as_str())
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
