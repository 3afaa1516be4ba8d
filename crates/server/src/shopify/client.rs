//! Shopify Admin API client.
//!
//! One client serves every connected store: each call takes the shop and
//! its offline access token. Reads use the REST Admin API with `Link`
//! header pagination; theme duplication goes through GraphQL because REST
//! has no duplicate endpoint.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ghost_cro_core::ShopDomain;
use graphql_client::GraphQLQuery;
use ghost_cro_core::checkout::{AbandonedCheckout, Order, ShippingZone};
use reqwest::header::LINK;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::config::ShopifyAppConfig;

use super::ShopifyError;
use super::queries::{ThemeDuplicate, theme_duplicate};
use super::types::{
    AccessToken, Asset, AssetEnvelope, CheckoutsEnvelope, OrdersEnvelope, ShippingZonesEnvelope,
    Theme, ThemeRole, ThemesEnvelope,
};

/// Records requested per REST page (Shopify's maximum).
const PAGE_LIMIT: u32 = 250;

/// Upper bound on pages fetched by a paginated read.
pub const MAX_ORDER_PAGES: usize = 10;

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Shopify Admin API client shared across stores.
#[derive(Clone)]
pub struct ShopifyClient {
    inner: Arc<ShopifyClientInner>,
}

struct ShopifyClientInner {
    client: reqwest::Client,
    api_key: String,
    api_secret: SecretString,
    api_version: String,
    scopes: Vec<String>,
    /// Replaces `https://{shop}` for every request when set.
    origin: Option<String>,
}

impl ShopifyClient {
    /// Create a client for the configured app.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ShopifyAppConfig) -> Result<Self, ShopifyError> {
        Self::build(config, None)
    }

    /// Create a client that sends every request to `origin` instead of the
    /// shop's own domain. Used to point the client at a local server.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::Http` if the HTTP client cannot be built.
    pub fn with_origin(
        config: &ShopifyAppConfig,
        origin: impl Into<String>,
    ) -> Result<Self, ShopifyError> {
        Self::build(config, Some(origin.into()))
    }

    fn build(config: &ShopifyAppConfig, origin: Option<String>) -> Result<Self, ShopifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(ShopifyClientInner {
                client,
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
                api_version: config.api_version.clone(),
                scopes: config.scopes.clone(),
                origin: origin.map(|o| o.trim_end_matches('/').to_string()),
            }),
        })
    }

    /// Get the app secret (for HMAC verification).
    #[must_use]
    pub fn api_secret(&self) -> &SecretString {
        &self.inner.api_secret
    }

    fn shop_origin(&self, shop: &ShopDomain) -> String {
        self.inner
            .origin
            .clone()
            .unwrap_or_else(|| format!("https://{}", shop.as_str()))
    }

    fn admin_url(&self, shop: &ShopDomain, path: &str) -> String {
        format!(
            "{}/admin/api/{}/{path}",
            self.shop_origin(shop),
            self.inner.api_version
        )
    }

    // =========================================================================
    // OAuth
    // =========================================================================

    /// Build the URL that starts the install flow for `shop`.
    #[must_use]
    pub fn authorization_url(&self, shop: &ShopDomain, redirect_uri: &str, state: &str) -> String {
        let scope = self.inner.scopes.join(",");
        format!(
            "https://{}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
            shop.as_str(),
            urlencoding::encode(&self.inner.api_key),
            urlencoding::encode(&scope),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for an offline access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if Shopify rejects the code.
    /// Returns `ShopifyError::Http` if the HTTP request fails.
    #[instrument(skip(self, code), fields(shop = %shop))]
    pub async fn exchange_code(
        &self,
        shop: &ShopDomain,
        code: &str,
    ) -> Result<AccessToken, ShopifyError> {
        let url = format!("{}/admin/oauth/access_token", self.shop_origin(shop));

        let params = [
            ("client_id", self.inner.api_key.as_str()),
            ("client_secret", self.inner.api_secret.expose_secret()),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!("Token exchange failed: {text}")));
        }

        Ok(response.json().await?)
    }

    // =========================================================================
    // REST reads
    // =========================================================================

    /// Fetch orders created since `since`, following pagination up to
    /// [`MAX_ORDER_PAGES`] pages.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn orders_since(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Order>, ShopifyError> {
        let url = self.admin_url(shop, "orders.json");
        let query = [
            ("status", "any".to_string()),
            ("created_at_min", since.to_rfc3339()),
            ("limit", PAGE_LIMIT.to_string()),
        ];

        self.paginate::<OrdersEnvelope, _>(url, &query, access_token, |page| page.orders)
            .await
    }

    /// Fetch abandoned checkouts created since `since`.
    ///
    /// # Errors
    ///
    /// Returns an error if any page request fails.
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn abandoned_checkouts(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<AbandonedCheckout>, ShopifyError> {
        let url = self.admin_url(shop, "checkouts.json");
        let query = [
            ("created_at_min", since.to_rfc3339()),
            ("limit", PAGE_LIMIT.to_string()),
        ];

        self.paginate::<CheckoutsEnvelope, _>(url, &query, access_token, |page| page.checkouts)
            .await
    }

    /// Fetch the store's shipping zones.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn shipping_zones(
        &self,
        shop: &ShopDomain,
        access_token: &str,
    ) -> Result<Vec<ShippingZone>, ShopifyError> {
        let url = self.admin_url(shop, "shipping_zones.json");
        let (page, _) = self
            .get_page::<ShippingZonesEnvelope>(&url, &[], access_token)
            .await?;
        Ok(page.shipping_zones)
    }

    /// List the store's themes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn themes(
        &self,
        shop: &ShopDomain,
        access_token: &str,
    ) -> Result<Vec<Theme>, ShopifyError> {
        let url = self.admin_url(shop, "themes.json");
        let (page, _) = self
            .get_page::<ThemesEnvelope>(&url, &[], access_token)
            .await?;
        Ok(page.themes)
    }

    /// Find the published theme.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no theme has the `main` role.
    pub async fn main_theme(
        &self,
        shop: &ShopDomain,
        access_token: &str,
    ) -> Result<Theme, ShopifyError> {
        self.themes(shop, access_token)
            .await?
            .into_iter()
            .find(|t| t.role == ThemeRole::Main)
            .ok_or_else(|| ShopifyError::NotFound("published theme".to_string()))
    }

    /// Read a text asset from a theme.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if the asset is missing or binary.
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn get_asset(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        theme_id: i64,
        key: &str,
    ) -> Result<String, ShopifyError> {
        let url = self.admin_url(shop, &format!("themes/{theme_id}/assets.json"));
        let query = [("asset[key]", key.to_string())];
        let (page, _) = self
            .get_page::<AssetEnvelope>(&url, &query, access_token)
            .await?;

        page.asset
            .value
            .ok_or_else(|| ShopifyError::NotFound(format!("text asset {key}")))
    }

    /// Create or replace a text asset in a theme.
    ///
    /// # Errors
    ///
    /// Returns an error if Shopify rejects the write.
    #[instrument(skip(self, access_token, value), fields(shop = %shop, bytes = value.len()))]
    pub async fn put_asset(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        theme_id: i64,
        key: &str,
        value: &str,
    ) -> Result<(), ShopifyError> {
        let url = self.admin_url(shop, &format!("themes/{theme_id}/assets.json"));
        let body = AssetEnvelope {
            asset: Asset {
                key: key.to_string(),
                value: Some(value.to_string()),
            },
        };

        let response = self
            .inner
            .client
            .put(&url)
            .header(ACCESS_TOKEN_HEADER, access_token)
            .json(&body)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    // =========================================================================
    // GraphQL
    // =========================================================================

    /// Copy a theme into a new unpublished theme named `name`.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::GraphQL` if the mutation reports errors.
    #[instrument(skip(self, access_token), fields(shop = %shop))]
    pub async fn duplicate_theme(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        theme_id: i64,
        name: &str,
    ) -> Result<Theme, ShopifyError> {
        let variables = theme_duplicate::Variables {
            id: format!("gid://shopify/OnlineStoreTheme/{theme_id}"),
            name: Some(name.to_string()),
        };
        let data = self
            .execute::<ThemeDuplicate>(shop, access_token, variables)
            .await?;

        let payload = data
            .theme_duplicate
            .ok_or_else(|| ShopifyError::GraphQL("empty themeDuplicate response".to_string()))?;

        if !payload.user_errors.is_empty() {
            let messages: Vec<_> = payload.user_errors.into_iter().map(|e| e.message).collect();
            return Err(ShopifyError::GraphQL(messages.join("; ")));
        }

        let theme = payload
            .new_theme
            .ok_or_else(|| ShopifyError::GraphQL("no theme returned".to_string()))?;

        Ok(Theme {
            id: parse_gid(&theme.id)?,
            name: theme.name,
            role: convert_role(&theme.role),
        })
    }

    /// Execute a GraphQL operation against a store's Admin API.
    async fn execute<Q: GraphQLQuery>(
        &self,
        shop: &ShopDomain,
        access_token: &str,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError>
    where
        Q::ResponseData: DeserializeOwned,
    {
        let url = self.admin_url(shop, "graphql.json");
        let body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&url)
            .header(ACCESS_TOKEN_HEADER, access_token)
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        let parsed: graphql_client::Response<Q::ResponseData> =
            serde_json::from_str(&response.text().await?)?;

        if let Some(errors) = parsed.errors
            && !errors.is_empty()
        {
            let messages: Vec<_> = errors.into_iter().map(|e| e.message).collect();
            return Err(ShopifyError::GraphQL(messages.join("; ")));
        }

        parsed
            .data
            .ok_or_else(|| ShopifyError::GraphQL("no data in response".to_string()))
    }

    // =========================================================================
    // Request plumbing
    // =========================================================================

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        access_token: &str,
    ) -> Result<(T, Option<String>), ShopifyError> {
        let response = self
            .inner
            .client
            .get(url)
            .header(ACCESS_TOKEN_HEADER, access_token)
            .query(query)
            .send()
            .await?;

        let response = check_status(response).await?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_url)
            .map(|next| self.rebase(&next));

        let body = response.text().await?;
        Ok((serde_json::from_str(&body)?, next))
    }

    async fn paginate<P: DeserializeOwned, T>(
        &self,
        url: String,
        query: &[(&str, String)],
        access_token: &str,
        items: impl Fn(P) -> Vec<T>,
    ) -> Result<Vec<T>, ShopifyError> {
        let mut out = Vec::new();
        let (page, mut next) = self.get_page::<P>(&url, query, access_token).await?;
        out.extend(items(page));

        let mut pages = 1;
        while let Some(next_url) = next.take() {
            if pages >= MAX_ORDER_PAGES {
                tracing::warn!(pages, "Stopped paginating at page limit");
                break;
            }
            // The cursor URL carries its own query; filters may not be repeated.
            let (page, following) = self.get_page::<P>(&next_url, &[], access_token).await?;
            out.extend(items(page));
            next = following;
            pages += 1;
        }

        Ok(out)
    }

    /// Keep cursor URLs on the configured origin.
    fn rebase(&self, next: &str) -> String {
        let Some(origin) = &self.inner.origin else {
            return next.to_string();
        };
        match url::Url::parse(next) {
            Ok(parsed) => {
                let query = parsed.query().map(|q| format!("?{q}")).unwrap_or_default();
                format!("{origin}{}{query}", parsed.path())
            }
            Err(_) => next.to_string(),
        }
    }
}

/// Map error statuses to `ShopifyError`, passing successful responses on.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ShopifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        // Shopify sends fractional seconds, e.g. "2.0"
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<f64>().ok())
            .map_or(2, |secs| secs.max(0.0).ceil() as u64);
        return Err(ShopifyError::RateLimited(retry_after));
    }

    let path = response.url().path().to_string();
    let text = response.text().await.unwrap_or_default();

    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            Err(ShopifyError::Unauthorized(text))
        }
        reqwest::StatusCode::NOT_FOUND => Err(ShopifyError::NotFound(path)),
        _ => Err(ShopifyError::Api {
            status: status.as_u16(),
            message: text,
        }),
    }
}

/// Extract the `rel="next"` URL from a `Link` header.
fn next_page_url(link: &str) -> Option<String> {
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        params
            .split(';')
            .any(|p| p.trim() == r#"rel="next""#)
            .then(|| {
                target
                    .trim()
                    .trim_start_matches('<')
                    .trim_end_matches('>')
                    .to_string()
            })
    })
}

fn parse_gid(gid: &str) -> Result<i64, ShopifyError> {
    gid.rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .ok_or_else(|| ShopifyError::GraphQL(format!("unexpected theme id {gid}")))
}

const fn convert_role(role: &theme_duplicate::ThemeRole) -> ThemeRole {
    match role {
        theme_duplicate::ThemeRole::MAIN => ThemeRole::Main,
        theme_duplicate::ThemeRole::UNPUBLISHED => ThemeRole::Unpublished,
        theme_duplicate::ThemeRole::DEMO => ThemeRole::Demo,
        theme_duplicate::ThemeRole::DEVELOPMENT => ThemeRole::Development,
        _ => ThemeRole::Other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> ShopifyAppConfig {
        ShopifyAppConfig {
            api_key: "key123".to_string(),
            api_secret: SecretString::from("shpss_test"),
            api_version: "2026-01".to_string(),
            scopes: vec!["read_orders".to_string(), "write_themes".to_string()],
        }
    }

    #[test]
    fn authorization_url_encodes_values() {
        let client = ShopifyClient::new(&config()).unwrap();
        let shop = ShopDomain::parse("acme.myshopify.com").unwrap();
        let url = client.authorization_url(&shop, "https://app.example.com/cb?x=1", "st ate");

        assert!(url.starts_with("https://acme.myshopify.com/admin/oauth/authorize?"));
        assert!(url.contains("client_id=key123"));
        assert!(url.contains("scope=read_orders%2Cwrite_themes"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fapp.example.com%2Fcb%3Fx%3D1"));
        assert!(url.contains("state=st%20ate"));
    }

    #[test]
    fn admin_url_uses_origin_override() {
        let client = ShopifyClient::with_origin(&config(), "http://127.0.0.1:9000/").unwrap();
        let shop = ShopDomain::parse("acme.myshopify.com").unwrap();
        assert_eq!(
            client.admin_url(&shop, "orders.json"),
            "http://127.0.0.1:9000/admin/api/2026-01/orders.json"
        );
    }

    #[test]
    fn link_header_next() {
        let header = r#"<https://acme.myshopify.com/admin/api/2026-01/orders.json?limit=250&page_info=abc>; rel="previous", <https://acme.myshopify.com/admin/api/2026-01/orders.json?limit=250&page_info=def>; rel="next""#;
        assert_eq!(
            next_page_url(header).as_deref(),
            Some("https://acme.myshopify.com/admin/api/2026-01/orders.json?limit=250&page_info=def")
        );

        let last = r#"<https://acme.myshopify.com/admin/api/2026-01/orders.json?page_info=abc>; rel="previous""#;
        assert_eq!(next_page_url(last), None);
    }

    #[test]
    fn rebase_keeps_origin() {
        let client = ShopifyClient::with_origin(&config(), "http://127.0.0.1:9000").unwrap();
        assert_eq!(
            client.rebase("https://acme.myshopify.com/admin/api/2026-01/orders.json?page_info=x"),
            "http://127.0.0.1:9000/admin/api/2026-01/orders.json?page_info=x"
        );
    }

    #[test]
    fn gid_and_role() {
        assert_eq!(parse_gid("gid://shopify/OnlineStoreTheme/123").unwrap(), 123);
        assert!(parse_gid("gid://shopify/OnlineStoreTheme/abc").is_err());
        assert_eq!(
            convert_role(&theme_duplicate::ThemeRole::UNPUBLISHED),
            ThemeRole::Unpublished
        );
        assert_eq!(
            convert_role(&theme_duplicate::ThemeRole::LOCKED),
            ThemeRole::Other
        );
    }
}
