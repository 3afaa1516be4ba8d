//! Checkout analysis endpoint.

use axum::{Json, Router, extract::State, routing::post};
use ghost_cro_core::benchmarks::Category;
use ghost_cro_core::calculations::{
    RevenueBaseline, RevenueLeak, ScoreBand, calculate_percentile_benchmark,
    calculate_revenue_leak,
};
use ghost_cro_core::{PersonaMix, TestResult};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::claude::{AnalysisRequest, analyze_store};
use crate::db::TestResultRepository;
use crate::error::AppError;
use crate::middleware::MerchantSession;
use crate::state::AppState;

use super::parse_shop;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/analyze", post(analyze))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub url: String,
    pub persona_mix: Option<String>,
    pub store_id: Option<String>,
    pub category: Option<String>,
    /// Traffic baseline for the leak estimate; defaults apply when absent.
    pub metrics: Option<RevenueBaseline>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub result: TestResult,
    pub revenue_leak: RevenueLeak,
    pub percentile: u8,
    pub score_band: ScoreBand,
    /// Share of simulated shoppers who completed a purchase.
    pub purchase_rate: f64,
    /// Whether the result was persisted and can be fetched by id later.
    pub saved: bool,
}

/// Accept bare domains ("acme.com") by assuming https.
fn normalize_url(raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::BadRequest("url is required".to_string()));
    }
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let parsed = url::Url::parse(&candidate)
        .map_err(|e| AppError::BadRequest(format!("invalid url: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(AppError::BadRequest(
            "url must be an http(s) address".to_string(),
        ));
    }
    Ok(parsed.to_string())
}

/// POST /api/analyze
#[instrument(skip(state, merchant, request), fields(url = %request.url))]
async fn analyze(
    State(state): State<AppState>,
    merchant: MerchantSession,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let url = normalize_url(&request.url)?;
    let persona_mix = match request.persona_mix.as_deref() {
        Some(name) => name
            .parse::<PersonaMix>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => PersonaMix::default(),
    };
    // Results saved against a store show up in its report list.
    let store = match request.store_id.as_deref() {
        Some(raw) => {
            let shop = parse_shop(raw)?;
            merchant.authorize(&shop)?;
            Some(shop.as_str().to_string())
        }
        None => None,
    };
    let category = request
        .category
        .as_deref()
        .map_or(Category::General, Category::parse_or_general);

    let analysis = AnalysisRequest {
        url,
        persona_mix,
        category,
        baseline: request.metrics,
        store,
    };
    let result = analyze_store(state.claude(), &analysis).await?;

    // The analysis has already been paid for; return it even if saving fails.
    let saved = match TestResultRepository::new(state.pool()).save(&result).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, id = %result.id, "Failed to save test result");
            false
        }
    };

    let baseline = request.metrics.unwrap_or_default();
    let revenue_leak = calculate_revenue_leak(Some(&result), &baseline);
    let percentile = calculate_percentile_benchmark(f64::from(result.score));

    Ok(Json(AnalyzeResponse {
        score_band: ScoreBand::from_score(result.score),
        purchase_rate: result.purchase_rate(),
        result,
        revenue_leak,
        percentile,
        saved,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_https() {
        assert_eq!(
            normalize_url("acme.example").ok().as_deref(),
            Some("https://acme.example/")
        );
    }

    #[test]
    fn non_http_rejected() {
        assert!(normalize_url("ftp://acme.example").is_err());
        assert!(normalize_url("   ").is_err());
        assert!(normalize_url("https://").is_err());
    }
}
