//! Merchant authorization for store-bound routes.
//!
//! The OAuth callback records every shop it connects in the session. Routes
//! that read a store's data or act on it with the stored Admin token take a
//! [`MerchantSession`] and check the requested shop against it.

use axum::{extract::FromRequestParts, http::request::Parts};
use ghost_cro_core::ShopDomain;
use tower_sessions::Session;

use crate::error::AppError;

/// Session keys.
pub mod session_keys {
    /// Shops connected through OAuth in this session.
    pub const CONNECTED_SHOPS: &str = "connected_shops";
}

/// Shops the current session has installed or re-authorized.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(merchant: MerchantSession, Json(req): Json<Req>) -> Result<_, AppError> {
///     let shop = parse_shop(&req.shop)?;
///     merchant.authorize(&shop)?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MerchantSession {
    shops: Vec<String>,
}

impl MerchantSession {
    /// Shops this session may act on.
    #[must_use]
    pub fn shops(&self) -> &[String] {
        &self.shops
    }

    /// Check that this session connected `shop`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when the session has no connected
    /// shop and `AppError::Forbidden` when it belongs to other shops.
    pub fn authorize(&self, shop: &ShopDomain) -> Result<(), AppError> {
        if self.shops.is_empty() {
            return Err(AppError::Unauthorized(
                "connect the store through Shopify first".to_string(),
            ));
        }
        if self.shops.iter().any(|s| s == shop.as_str()) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("session is not authorized for {shop}")))
        }
    }
}

impl<S> FromRequestParts<S> for MerchantSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let shops = match parts.extensions.get::<Session>() {
            Some(session) => connected_shops(session).await,
            None => Vec::new(),
        };
        Ok(Self { shops })
    }
}

async fn connected_shops(session: &Session) -> Vec<String> {
    match session.get::<Vec<String>>(session_keys::CONNECTED_SHOPS).await {
        Ok(shops) => shops.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read session");
            Vec::new()
        }
    }
}

/// Record `shop` as connected in this session and rotate the session ID.
///
/// # Errors
///
/// Returns the session store error if the session cannot be saved.
pub async fn remember_shop(
    session: &Session,
    shop: &ShopDomain,
) -> Result<(), tower_sessions::session::Error> {
    let mut shops = connected_shops(session).await;
    if !shops.iter().any(|s| s == shop.as_str()) {
        shops.push(shop.as_str().to_string());
    }
    session.insert(session_keys::CONNECTED_SHOPS, shops).await?;
    session.cycle_id().await
}
