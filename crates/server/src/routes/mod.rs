//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness
//! GET  /health/ready                  - Readiness (database)
//!
//! # Shopify
//! GET  /api/auth/shopify              - Start app install (OAuth)
//! GET  /api/auth/shopify/callback     - OAuth callback
//! POST /api/shopify/webhooks          - Webhooks (HMAC verified)
//! POST /api/shopify/metrics           - Store metrics from orders and checkouts
//! POST /api/shopify/sandbox           - Inject fixes into a sandbox theme
//!
//! # Analysis
//! POST /api/analyze                   - Claude persona simulation (rate limited)
//! GET  /api/reports/{id}              - Saved test result
//! GET  /api/stores/{shop}/reports     - Saved results for a store
//! POST /api/analytics/ga4             - GA4 conversion metrics
//!
//! # Calculations
//! POST /api/calculations/opportunity  - Revenue opportunity
//! GET  /api/benchmarks/{category}     - Category benchmark, optionally compared
//!                                       with store numbers
//!
//! # Billing
//! POST /api/stripe/webhook            - Disabled, acknowledges only
//! ```
//!
//! Store-bound routes check the requested shop against the
//! [`MerchantSession`](crate::middleware::MerchantSession) recorded by the
//! OAuth callback.

use axum::Router;
use ghost_cro_core::ShopDomain;
use secrecy::ExposeSecret;

use crate::db::StoreRepository;
use crate::error::AppError;
use crate::middleware::{analyze_rate_limiter, api_rate_limiter};
use crate::state::AppState;

pub mod analytics;
pub mod analyze;
pub mod calculations;
pub mod health;
pub mod metrics;
pub mod reports;
pub mod sandbox;
pub mod shopify_auth;
pub mod stripe;
pub mod webhooks;

/// Build the API router.
///
/// Webhooks are not rate limited: Shopify retries on 429 and delivers from
/// a shared pool of addresses.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(shopify_auth::router())
        .merge(metrics::router())
        .merge(sandbox::router())
        .merge(reports::router())
        .merge(analytics::router())
        .merge(calculations::router())
        .layer(api_rate_limiter());

    let analysis = analyze::router().layer(analyze_rate_limiter());

    Router::new()
        .merge(health::router())
        .merge(webhooks::router())
        .merge(stripe::router())
        .merge(api)
        .merge(analysis)
}

/// Parse a shop domain from request input.
pub(crate) fn parse_shop(raw: &str) -> Result<ShopDomain, AppError> {
    ShopDomain::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Load an installed store and its Admin API token.
///
/// # Errors
///
/// Returns `AppError::NotFound` for unknown stores and
/// `AppError::Unauthorized` once the app has been uninstalled.
pub(crate) async fn connected_store(
    state: &AppState,
    shop: &ShopDomain,
) -> Result<String, AppError> {
    let store = StoreRepository::new(state.pool())
        .get_by_shop(shop)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("store {shop}")))?;

    match (&store.access_token, store.installed) {
        (Some(token), true) => Ok(token.expose_secret().to_string()),
        _ => Err(AppError::Unauthorized(format!("{shop} is not connected"))),
    }
}
