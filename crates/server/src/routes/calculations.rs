//! Stateless calculation endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query},
    routing::{get, post},
};
use ghost_cro_core::benchmarks::{
    Category, CategoryBenchmark, MetricComparison, StoreSnapshot, compare_to_benchmark,
};
use serde::Serialize;
use ghost_cro_core::calculations::{
    OpportunityInput, RevenueOpportunity, calculate_revenue_opportunity,
};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/calculations/opportunity", post(opportunity))
        .route("/api/benchmarks/{category}", get(benchmark))
}

/// POST /api/calculations/opportunity
async fn opportunity(Json(input): Json<OpportunityInput>) -> Json<RevenueOpportunity> {
    Json(calculate_revenue_opportunity(&input))
}

#[derive(Debug, Serialize)]
pub struct BenchmarkResponse {
    #[serde(flatten)]
    pub benchmark: CategoryBenchmark,
    /// One entry per store number given in the query string.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comparison: Vec<MetricComparison>,
}

/// GET /api/benchmarks/{category}?conversionRate=&aov=&cartAbandonmentRate=
///
/// Unknown categories are rejected here rather than mapped to `general`,
/// so a typo in a dashboard link is visible.
async fn benchmark(
    Path(category): Path<String>,
    Query(store): Query<StoreSnapshot>,
) -> Result<Json<BenchmarkResponse>, AppError> {
    let category = category
        .parse::<Category>()
        .map_err(|e| AppError::NotFound(e.to_string()))?;
    Ok(Json(BenchmarkResponse {
        benchmark: category.benchmark(),
        comparison: compare_to_benchmark(&store, category),
    }))
}
