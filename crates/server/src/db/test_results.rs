//! Saved checkout test reports.
//!
//! The full [`TestResult`] is stored as a JSONB payload; the id, store, url,
//! score and status are duplicated into columns for listing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use ghost_cro_core::{ShopDomain, TestResult};

use super::RepositoryError;

/// Maximum number of reports returned by [`TestResultRepository::list_for_store`].
pub const LIST_LIMIT: i64 = 50;

/// Listing entry for a saved report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TestResultSummary {
    pub id: Uuid,
    pub url: String,
    pub score: i16,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct PayloadRow {
    payload: Json<TestResult>,
}

/// Repository for saved test results.
pub struct TestResultRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TestResultRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Save a result, replacing any earlier version with the same id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn save(&self, result: &TestResult) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO test_results (id, shop, url, score, status, payload, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                score = EXCLUDED.score,
                status = EXCLUDED.status,
                payload = EXCLUDED.payload
            ",
        )
        .bind(result.id)
        .bind(result.store.as_deref())
        .bind(&result.url)
        .bind(i16::from(result.score))
        .bind(result.status.as_str())
        .bind(Json(result))
        .bind(result.created_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Get a saved result by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, which includes
    /// a payload that no longer decodes.
    pub async fn get(&self, id: Uuid) -> Result<Option<TestResult>, RepositoryError> {
        let row = sqlx::query_as::<_, PayloadRow>("SELECT payload FROM test_results WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(|r| r.payload.0))
    }

    /// List a store's saved results, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(
        &self,
        shop: &ShopDomain,
    ) -> Result<Vec<TestResultSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, TestResultSummary>(
            r"
            SELECT id, url, score, status, created_at
            FROM test_results
            WHERE shop = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(shop.as_str())
        .bind(LIST_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
