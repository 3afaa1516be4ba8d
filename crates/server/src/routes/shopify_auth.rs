//! Shopify app install (OAuth) routes.
//!
//! `GET /api/auth/shopify?shop=` stores a random `state` in the session and
//! redirects to Shopify's consent screen. Shopify sends the merchant back
//! to the callback, which verifies the HMAC and state, exchanges the code
//! for an offline token, records the install and marks the shop as
//! connected in the merchant's session.

use axum::{
    Router,
    extract::{Query, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::StoreRepository;
use crate::error::AppError;
use crate::middleware::remember_shop;
use crate::shopify::webhook::verify_oauth_hmac;
use crate::state::AppState;

use super::parse_shop;

const OAUTH_STATE_KEY: &str = "shopify_oauth_state";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/shopify", get(install))
        .route("/api/auth/shopify/callback", get(callback))
}

#[derive(Debug, Deserialize)]
pub struct InstallParams {
    pub shop: Option<String>,
}

/// GET /api/auth/shopify - Start the install flow.
#[instrument(skip(state, session))]
async fn install(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<InstallParams>,
) -> Result<Response, AppError> {
    let raw = params
        .shop
        .ok_or_else(|| AppError::BadRequest("missing shop parameter".to_string()))?;
    let shop = parse_shop(&raw)?;

    // Random state parameter for CSRF protection
    let oauth_state = uuid::Uuid::new_v4().to_string();
    session
        .insert(OAUTH_STATE_KEY, &oauth_state)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store OAuth state: {e}")))?;

    let redirect_uri = state.config().shopify_redirect_uri();
    let auth_url = state
        .shopify()
        .authorization_url(&shop, &redirect_uri, &oauth_state);

    tracing::info!(shop = %shop, "Redirecting to Shopify OAuth");
    Ok(Redirect::to(&auth_url).into_response())
}

/// GET /api/auth/shopify/callback - Finish the install flow.
///
/// Failures redirect to the dashboard with an `error` code rather than
/// returning JSON, since the merchant's browser lands here.
#[instrument(skip(state, session, query))]
async fn callback(
    State(state): State<AppState>,
    session: Session,
    RawQuery(query): RawQuery,
) -> Response {
    let dashboard = format!("{}/dashboard", state.config().app_url);
    let fail = |code: &str| Redirect::to(&format!("{dashboard}?error={code}")).into_response();

    let params: Vec<(String, String)> = url::form_urlencoded::parse(
        query.as_deref().unwrap_or_default().as_bytes(),
    )
    .into_owned()
    .collect();
    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    };

    if let Some(error) = param("error") {
        let description = param("error_description").unwrap_or_default();
        tracing::warn!(error, description, "Shopify OAuth denied");
        return fail("oauth_denied");
    }

    if !verify_oauth_hmac(state.shopify().api_secret().expose_secret(), &params) {
        tracing::error!("Invalid HMAC signature in OAuth callback");
        return fail("invalid_hmac");
    }

    let (Some(code), Some(callback_state), Some(raw_shop)) =
        (param("code"), param("state"), param("shop"))
    else {
        tracing::error!("OAuth callback missing code, state or shop");
        return fail("oauth_failed");
    };

    let stored_state: Option<String> = session.get(OAUTH_STATE_KEY).await.ok().flatten();
    if stored_state.as_deref() != Some(callback_state) {
        tracing::error!("OAuth state mismatch - possible CSRF attack");
        return fail("invalid_state");
    }
    if let Err(e) = session.remove::<String>(OAUTH_STATE_KEY).await {
        tracing::warn!(error = %e, "Failed to clear OAuth state from session");
    }

    let Ok(shop) = parse_shop(raw_shop) else {
        tracing::error!(shop = raw_shop, "OAuth callback for invalid shop domain");
        return fail("invalid_shop");
    };

    let token = match state.shopify().exchange_code(&shop, code).await {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(shop = %shop, error = %e, "Failed to exchange OAuth code");
            return fail("exchange_failed");
        }
    };

    if let Err(e) = StoreRepository::new(state.pool())
        .upsert_installation(&shop, &token.access_token, &token.scope)
        .await
    {
        tracing::error!(shop = %shop, error = %e, "Failed to save store");
        return fail("save_failed");
    }

    if let Err(e) = remember_shop(&session, &shop).await {
        tracing::error!(shop = %shop, error = %e, "Failed to save merchant session");
        return fail("session_failed");
    }

    tracing::info!(shop = %shop, scope = %token.scope, "Store connected");
    Redirect::to(&format!(
        "{dashboard}?shop={}&connected=true",
        urlencoding::encode(shop.as_str())
    ))
    .into_response()
}
