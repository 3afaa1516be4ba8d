//! Shopify webhook receiver.
//!
//! Every delivery is verified against `X-Shopify-Hmac-Sha256` before the
//! body is parsed. Topics we do not act on are still acknowledged with 200
//! so Shopify does not retry them.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
};
use ghost_cro_core::ShopDomain;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::{RepositoryError, StoreRepository};
use crate::error::AppError;
use crate::shopify::webhook::{HMAC_HEADER, SHOP_HEADER, TOPIC_HEADER, verify_webhook_hmac};
use crate::state::AppState;

use super::parse_shop;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/shopify/webhooks", post(receive))
}

#[derive(Debug, Deserialize)]
struct SubscriptionUpdate {
    app_subscription: AppSubscription,
}

#[derive(Debug, Deserialize)]
struct AppSubscription {
    name: String,
    status: String,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// POST /api/shopify/webhooks
#[instrument(skip(state, headers, body), fields(topic, shop))]
async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let signature = header(&headers, HMAC_HEADER)
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_string()))?;

    if !verify_webhook_hmac(
        state.shopify().api_secret().expose_secret(),
        &body,
        signature,
    ) {
        tracing::warn!("Webhook HMAC verification failed");
        return Err(AppError::Unauthorized("invalid webhook signature".to_string()));
    }

    let shop = header(&headers, SHOP_HEADER)
        .ok_or_else(|| AppError::BadRequest("missing shop domain header".to_string()))?;
    let shop = parse_shop(shop)?;
    let topic = header(&headers, TOPIC_HEADER).unwrap_or_default();

    let span = tracing::Span::current();
    span.record("topic", topic);
    span.record("shop", shop.as_str());

    handle_topic(&state, &shop, topic, &body).await?;

    Ok(Json(json!({ "received": true })))
}

async fn handle_topic(
    state: &AppState,
    shop: &ShopDomain,
    topic: &str,
    body: &[u8],
) -> Result<(), AppError> {
    let stores = StoreRepository::new(state.pool());

    match topic {
        "app_subscriptions/update" => {
            let update: SubscriptionUpdate = serde_json::from_slice(body)
                .map_err(|e| AppError::BadRequest(format!("invalid subscription payload: {e}")))?;
            let subscription = update.app_subscription;

            match stores
                .update_subscription(shop, &subscription.name, &subscription.status)
                .await
            {
                Ok(()) => tracing::info!(
                    plan = %subscription.name,
                    status = %subscription.status,
                    "Subscription updated"
                ),
                Err(RepositoryError::NotFound) => {
                    tracing::warn!("Subscription update for unknown store");
                }
                Err(e) => return Err(e.into()),
            }
        }
        "app/uninstalled" => {
            if stores.mark_uninstalled(shop).await? {
                tracing::info!("Store uninstalled");
            } else {
                tracing::warn!("Uninstall for unknown store");
            }
        }
        // Mandatory compliance topics. No customer data is stored, so
        // there is nothing to export or erase.
        "customers/data_request" | "customers/redact" | "shop/redact" => {
            tracing::info!("Compliance webhook acknowledged");
        }
        _ => {
            tracing::warn!("Unhandled webhook topic");
        }
    }

    Ok(())
}
