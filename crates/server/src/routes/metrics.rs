//! Store metrics from the Shopify Admin API.

use axum::{Json, Router, extract::State, routing::post};
use chrono::Utc;
use ghost_cro_core::StoreMetrics;
use ghost_cro_core::checkout::{
    AbandonedCheckout, AbandonedCheckoutStats, ShippingShockAnalysis, ShippingZone,
    analyze_shipping_shock, calculate_abandoned_checkout_stats, derive_store_metrics,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::MerchantSession;
use crate::state::AppState;

use super::{connected_store, parse_shop};

const DEFAULT_DAYS: u32 = 30;
const MAX_DAYS: u32 = 365;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/shopify/metrics", post(store_metrics))
}

#[derive(Debug, Deserialize)]
pub struct MetricsRequest {
    pub shop: String,
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub metrics: StoreMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abandoned_checkouts: Option<AbandonedCheckoutStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_shock: Option<ShippingShockAnalysis>,
}

/// Checkout analyses for whatever loaded. Without shipping zones the shock
/// analysis still runs, just with no free-shipping threshold.
fn checkout_sections(
    checkouts: Option<&[AbandonedCheckout]>,
    zones: Option<&[ShippingZone]>,
    order_count: u64,
) -> (Option<AbandonedCheckoutStats>, Option<ShippingShockAnalysis>) {
    let Some(checkouts) = checkouts else {
        return (None, None);
    };
    (
        Some(calculate_abandoned_checkout_stats(checkouts, order_count)),
        Some(analyze_shipping_shock(checkouts, zones.unwrap_or_default())),
    )
}

/// POST /api/shopify/metrics
///
/// Orders are required. Checkouts and shipping zones need extra scopes a
/// store may not have granted, so their failures are logged and the
/// sections omitted.
#[instrument(skip(state, merchant, request), fields(shop = %request.shop))]
async fn store_metrics(
    State(state): State<AppState>,
    merchant: MerchantSession,
    Json(request): Json<MetricsRequest>,
) -> Result<Json<MetricsResponse>, AppError> {
    let shop = parse_shop(&request.shop)?;
    merchant.authorize(&shop)?;
    let days = request.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS);
    let token = connected_store(&state, &shop).await?;

    let since = Utc::now() - chrono::Duration::days(i64::from(days));
    let client = state.shopify();

    let (orders, checkouts, zones) = tokio::join!(
        client.orders_since(&shop, &token, since),
        client.abandoned_checkouts(&shop, &token, since),
        client.shipping_zones(&shop, &token),
    );

    let orders = orders?;
    let metrics = derive_store_metrics(&orders, days);

    let checkouts = checkouts
        .inspect_err(|e| tracing::warn!(error = %e, "Abandoned checkouts unavailable"))
        .ok();
    let zones = zones
        .inspect_err(|e| tracing::warn!(error = %e, "Shipping zones unavailable"))
        .ok();

    let (abandoned_checkouts, shipping_shock) =
        checkout_sections(checkouts.as_deref(), zones.as_deref(), metrics.order_count);

    tracing::info!(
        orders = metrics.order_count,
        checkouts = checkouts.as_ref().map_or(0, Vec::len),
        "Store metrics computed"
    );

    Ok(Json(MetricsResponse {
        metrics,
        abandoned_checkouts,
        shipping_shock,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn checkouts() -> Vec<AbandonedCheckout> {
        serde_json::from_str(
            r#"[
                {"id": 1, "created_at": "2026-03-01T10:00:00Z", "subtotal_price": "40.00",
                 "total_price": "48.00", "shipping_lines": [{"title": "Standard", "price": "8.00"}]},
                {"id": 2, "created_at": "2026-03-02T10:00:00Z", "subtotal_price": "90.00",
                 "total_price": "95.00", "shipping_lines": [{"title": "Standard", "price": "5.00"}]}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn shipping_shock_without_zones() {
        let checkouts = checkouts();
        let (abandoned, shock) = checkout_sections(Some(&checkouts), None, 10);

        assert_eq!(abandoned.unwrap().total_abandoned, 2);
        let shock = shock.unwrap();
        assert_eq!(shock.checkouts_analyzed, 2);
        assert_eq!(shock.shock_count, 1);
        assert_eq!(shock.free_shipping_threshold, None);
    }

    #[test]
    fn zones_feed_the_threshold() {
        let checkouts = checkouts();
        let zones: Vec<ShippingZone> = serde_json::from_str(
            r#"[{"name": "Domestic", "price_based_shipping_rates": [
                {"name": "Free over 75", "price": "0.00", "min_order_subtotal": "75.00"}
            ]}]"#,
        )
        .unwrap();
        let (_, shock) = checkout_sections(Some(&checkouts), Some(&zones), 10);
        let threshold = shock.unwrap().free_shipping_threshold.unwrap();
        assert!((threshold - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn nothing_without_checkouts() {
        let (abandoned, shock) = checkout_sections(None, Some(&[]), 10);
        assert!(abandoned.is_none());
        assert!(shock.is_none());
    }
}
