//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::claude::{ClaudeClient, ClaudeError};
use crate::config::ServerConfig;
use crate::ga4::{Ga4Client, Ga4Error};
use crate::shopify::{ShopifyClient, ShopifyError};

/// Error building the shared clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("shopify client: {0}")]
    Shopify(#[from] ShopifyError),
    #[error("ga4 client: {0}")]
    Ga4(#[from] Ga4Error),
    #[error("claude client: {0}")]
    Claude(#[from] ClaudeError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the configuration, the database pool
/// and one client per upstream service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    shopify: ShopifyClient,
    ga4: Ga4Client,
    claude: ClaudeClient,
}

impl AppState {
    /// Create the state with clients pointed at the real services.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let shopify = ShopifyClient::new(&config.shopify)?;
        let ga4 = Ga4Client::new(config.google.clone())?;
        let claude = ClaudeClient::new(&config.claude)?;

        Ok(Self::from_parts(config, pool, shopify, ga4, claude))
    }

    /// Assemble the state from pre-built clients.
    #[must_use]
    pub fn from_parts(
        config: ServerConfig,
        pool: PgPool,
        shopify: ShopifyClient,
        ga4: Ga4Client,
        claude: ClaudeClient,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                shopify,
                ga4,
                claude,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn shopify(&self) -> &ShopifyClient {
        &self.inner.shopify
    }

    #[must_use]
    pub fn ga4(&self) -> &Ga4Client {
        &self.inner.ga4
    }

    #[must_use]
    pub fn claude(&self) -> &ClaudeClient {
        &self.inner.claude
    }
}
