//! Shopify Admin API access for connected stores.
//!
//! - [`ShopifyClient`] - OAuth code exchange and the REST/GraphQL calls the
//!   metrics and sandbox endpoints need, authenticated per store with the
//!   offline token saved at install
//! - [`webhook`] - HMAC verification for OAuth callbacks and webhooks

mod client;
pub mod queries;
pub mod types;
pub mod webhook;

pub use client::{MAX_ORDER_PAGES, ShopifyClient};
pub use types::{AccessToken, Asset, Theme, ThemeRole};

use thiserror::Error;

/// Errors that can occur when interacting with the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The access token is invalid, revoked, or lacks a scope.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// OAuth code exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// GraphQL mutation returned user errors.
    #[error("GraphQL errors: {0}")]
    GraphQL(String),

    /// Any other non-success response.
    #[error("Shopify API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },
}
