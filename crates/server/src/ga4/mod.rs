//! Google Analytics 4 Data API client.
//!
//! Two ways in: a service-account key supplied with the request (signed
//! into a JWT and exchanged for an access token, cached until shortly
//! before expiry), or the OAuth tokens stored for a connected store
//! (refreshed with the refresh-token grant when they are about to expire).

mod auth;
mod report;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use moka::future::Cache;
use thiserror::Error;

use crate::config::GoogleOAuthConfig;

pub use auth::{RefreshedToken, ServiceAccountKey};
pub use report::DateRange;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DATA_API_URL: &str = "https://analyticsdata.googleapis.com/v1beta";

/// Refresh tokens this many seconds before they expire.
pub const EXPIRY_MARGIN_SECS: i64 = 60;

/// Errors from the GA4 client.
#[derive(Debug, Error)]
pub enum Ga4Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The service-account key could not be used to sign a JWT.
    #[error("Invalid service account credentials: {0}")]
    InvalidCredentials(String),

    /// Google rejected a request.
    #[error("{message}")]
    Upstream {
        /// HTTP status from Google.
        status: u16,
        /// Error message from the response body.
        message: String,
    },

    /// The store has no GA4 connection.
    #[error("No GA4 connection for {0}")]
    NotConnected(String),

    /// Stored tokens need refreshing but no Google OAuth client is configured.
    #[error("Google OAuth client not configured")]
    NotConfigured,
}

impl From<jsonwebtoken::errors::Error> for Ga4Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::InvalidCredentials(err.to_string())
    }
}

impl Ga4Error {
    /// HTTP status to report to the caller.
    ///
    /// Upstream messages are classified so that expired grants surface as
    /// 401 and missing property access as 403.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials(_) => StatusCode::BAD_REQUEST,
            Self::NotConnected(_) => StatusCode::NOT_FOUND,
            Self::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { message, .. } => {
                classify_message(message).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Http(_) | Self::Parse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Map a Google error message to a client-facing status.
#[must_use]
pub fn classify_message(message: &str) -> Option<StatusCode> {
    if message.contains("expired") || message.contains("invalid_grant") {
        Some(StatusCode::UNAUTHORIZED)
    } else if message.contains("Permission denied") || message.contains("PERMISSION_DENIED") {
        Some(StatusCode::FORBIDDEN)
    } else if message.to_ascii_lowercase().contains("not found") {
        Some(StatusCode::NOT_FOUND)
    } else {
        None
    }
}

/// A cached service-account access token.
#[derive(Clone)]
struct CachedToken {
    access_token: String,
    valid_until: std::time::Instant,
}

/// GA4 Data API client.
#[derive(Clone)]
pub struct Ga4Client {
    inner: Arc<Ga4ClientInner>,
}

struct Ga4ClientInner {
    client: reqwest::Client,
    google: Option<GoogleOAuthConfig>,
    /// Service-account tokens keyed by a digest of the key.
    token_cache: Cache<String, CachedToken>,
    token_url: String,
    data_api_url: String,
}

impl Ga4Client {
    /// Create a client against Google's endpoints.
    ///
    /// # Errors
    ///
    /// Returns `Ga4Error::Http` if the HTTP client cannot be built.
    pub fn new(google: Option<GoogleOAuthConfig>) -> Result<Self, Ga4Error> {
        Self::with_endpoints(google, TOKEN_URL, DATA_API_URL)
    }

    /// Create a client with custom token and Data API endpoints.
    ///
    /// # Errors
    ///
    /// Returns `Ga4Error::Http` if the HTTP client cannot be built.
    pub fn with_endpoints(
        google: Option<GoogleOAuthConfig>,
        token_url: impl Into<String>,
        data_api_url: impl Into<String>,
    ) -> Result<Self, Ga4Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        // Google issues hour-long tokens; entries are also checked against
        // their own expiry on read.
        let token_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(3600))
            .build();

        Ok(Self {
            inner: Arc::new(Ga4ClientInner {
                client,
                google,
                token_cache,
                token_url: token_url.into(),
                data_api_url: data_api_url.into().trim_end_matches('/').to_string(),
            }),
        })
    }
}

/// Google's JSON error bodies: `{"error": {"message", "status"}}` from
/// the Data API, `{"error", "error_description"}` from the token endpoint.
pub(crate) fn upstream_error(status: u16, body: &str) -> Ga4Error {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            let err = v.get("error")?;
            if let Some(obj) = err.as_object() {
                let message = obj.get("message").and_then(|m| m.as_str()).unwrap_or("");
                let code = obj.get("status").and_then(|s| s.as_str()).unwrap_or("");
                Some(format!("{code}: {message}").trim_start_matches(": ").to_string())
            } else {
                let code = err.as_str().unwrap_or("");
                let description = v
                    .get("error_description")
                    .and_then(|d| d.as_str())
                    .unwrap_or("");
                Some(format!("{code}: {description}"))
            }
        })
        .unwrap_or_else(|| body.to_string());

    Ga4Error::Upstream { status, message }
}
