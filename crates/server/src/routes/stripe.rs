//! Stripe webhook endpoint.
//!
//! Billing runs through Shopify app subscriptions; the Stripe endpoint stays
//! mounted so existing webhook registrations do not fail, and acknowledges
//! every delivery without processing it.

use axum::{Json, Router, routing::post};
use serde_json::{Value, json};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/stripe/webhook", post(webhook))
}

async fn webhook() -> Json<Value> {
    tracing::debug!("Stripe webhook ignored");
    Json(json!({ "received": true }))
}
