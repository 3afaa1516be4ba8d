//! Saved test results.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use ghost_cro_core::TestResult;
use tracing::instrument;
use uuid::Uuid;

use crate::db::{TestResultRepository, TestResultSummary};
use crate::error::AppError;
use crate::middleware::MerchantSession;
use crate::state::AppState;

use super::parse_shop;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports/{id}", get(get_report))
        .route("/api/stores/{shop}/reports", get(list_reports))
}

/// GET /api/reports/{id}
///
/// Reports run for a connected store are only visible to a session that
/// connected it; URL-only reports are shareable by ID.
#[instrument(skip(state, merchant))]
async fn get_report(
    State(state): State<AppState>,
    merchant: MerchantSession,
    Path(id): Path<Uuid>,
) -> Result<Json<TestResult>, AppError> {
    let report = TestResultRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("report {id}")))?;

    if let Some(store) = &report.store {
        merchant.authorize(&parse_shop(store)?)?;
    }
    Ok(Json(report))
}

/// GET /api/stores/{shop}/reports
#[instrument(skip(state, merchant))]
async fn list_reports(
    State(state): State<AppState>,
    merchant: MerchantSession,
    Path(shop): Path<String>,
) -> Result<Json<Vec<TestResultSummary>>, AppError> {
    let shop = parse_shop(&shop)?;
    merchant.authorize(&shop)?;
    let reports = TestResultRepository::new(state.pool())
        .list_for_store(&shop)
        .await?;
    Ok(Json(reports))
}
