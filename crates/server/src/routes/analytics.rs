//! GA4 metrics proxy.

use axum::{Json, Router, extract::State, routing::post};
use chrono::{NaiveDate, Utc};
use ghost_cro_core::Ga4Metrics;
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use crate::db::Ga4ConnectionRepository;
use crate::error::AppError;
use crate::middleware::MerchantSession;
use crate::ga4::{DateRange, EXPIRY_MARGIN_SECS, Ga4Error, ServiceAccountKey};
use crate::state::AppState;

use super::parse_shop;

/// Reporting window when the request gives no dates.
const DEFAULT_DAYS: u32 = 30;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/analytics/ga4", post(ga4_metrics))
}

/// Service-account credentials, as a JSON object or the key file's text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Credentials {
    Key(ServiceAccountKey),
    Json(String),
}

impl Credentials {
    fn into_key(self) -> Result<ServiceAccountKey, AppError> {
        match self {
            Self::Key(key) => Ok(key),
            Self::Json(text) => serde_json::from_str(&text)
                .map_err(|e| AppError::BadRequest(format!("invalid credentials: {e}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ga4Request {
    /// GA4 property; defaults to the stored connection's property.
    pub property_id: Option<String>,
    pub credentials: Option<Credentials>,
    /// Connected store whose stored OAuth tokens to use.
    pub store_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<DateRange, AppError> {
    let end = end.unwrap_or_else(|| Utc::now().date_naive());
    let range = match start {
        Some(start) => DateRange { start, end },
        None => DateRange::ending(end, DEFAULT_DAYS),
    };
    if range.start > range.end {
        return Err(AppError::BadRequest(
            "startDate must not be after endDate".to_string(),
        ));
    }
    Ok(range)
}

/// POST /api/analytics/ga4
#[instrument(skip(state, merchant, request), fields(store_id = ?request.store_id))]
async fn ga4_metrics(
    State(state): State<AppState>,
    merchant: MerchantSession,
    Json(request): Json<Ga4Request>,
) -> Result<Json<Ga4Metrics>, AppError> {
    let range = date_range(request.start_date, request.end_date)?;
    let ga4 = state.ga4();

    let (access_token, property_id) = match (request.credentials, request.store_id) {
        (Some(credentials), _) => {
            let property_id = request
                .property_id
                .ok_or_else(|| AppError::BadRequest("missing propertyId".to_string()))?;
            let key = credentials.into_key()?;
            (ga4.service_account_token(&key).await?, property_id)
        }
        (None, Some(store_id)) => {
            let shop = parse_shop(&store_id)?;
            merchant.authorize(&shop)?;
            let repo = Ga4ConnectionRepository::new(state.pool());
            let connection = repo
                .get(&shop)
                .await?
                .ok_or_else(|| Ga4Error::NotConnected(shop.to_string()))?;

            let token = match &connection.refresh_token {
                Some(refresh) if connection.expires_within(EXPIRY_MARGIN_SECS, Utc::now()) => {
                    let refreshed = ga4.refresh_access_token(refresh.expose_secret()).await?;
                    repo.update_access_token(
                        &connection.shop,
                        &refreshed.access_token,
                        refreshed.expires_at,
                    )
                    .await?;
                    tracing::info!("GA4 access token refreshed");
                    refreshed.access_token
                }
                _ => connection.access_token.expose_secret().to_string(),
            };

            (token, request.property_id.unwrap_or(connection.property_id))
        }
        (None, None) => {
            return Err(AppError::BadRequest(
                "either credentials or storeId is required".to_string(),
            ));
        }
    };

    let metrics = ga4.run_report(&access_token, &property_id, range).await?;
    Ok(Json(metrics))
}
