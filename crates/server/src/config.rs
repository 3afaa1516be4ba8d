//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GHOST_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `GHOST_BASE_URL` - Public URL of this API (used for the OAuth redirect URI)
//! - `SHOPIFY_API_KEY` - Shopify app client ID
//! - `SHOPIFY_API_SECRET` - Shopify app client secret (OAuth + webhook HMAC)
//! - `ANTHROPIC_API_KEY` - Anthropic API key
//!
//! ## Optional
//! - `GHOST_HOST` - Bind address (default: 127.0.0.1)
//! - `GHOST_PORT` - Listen port (default: 3000)
//! - `GHOST_APP_URL` - Dashboard URL merchants land on after install (default: base URL)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2025-01)
//! - `SHOPIFY_SCOPES` - Comma-separated OAuth scopes
//! - `CLAUDE_MODEL` - Claude model ID (default: claude-sonnet-4-20250514)
//! - `GOOGLE_CLIENT_ID` / `GOOGLE_CLIENT_SECRET` - Enables GA4 token refresh (both or neither)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_SHOPIFY_API_VERSION: &str = "2025-01";
const DEFAULT_SHOPIFY_SCOPES: &str =
    "read_orders,read_checkouts,read_shipping,read_themes,write_themes";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL of this API, without trailing slash
    pub base_url: String,
    /// Dashboard URL merchants are redirected to after installing
    pub app_url: String,
    pub shopify: ShopifyAppConfig,
    pub claude: ClaudeConfig,
    /// Google OAuth client used to refresh stored GA4 tokens
    pub google: Option<GoogleOAuthConfig>,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

/// Shopify app credentials.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct ShopifyAppConfig {
    /// App client ID
    pub api_key: String,
    /// App client secret; signs OAuth callbacks and webhooks
    pub api_secret: SecretString,
    /// Admin API version (e.g., 2025-01)
    pub api_version: String,
    /// OAuth scopes requested at install
    pub scopes: Vec<String>,
}

impl std::fmt::Debug for ShopifyAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyAppConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Claude AI API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct ClaudeConfig {
    pub api_key: SecretString,
    pub model: String,
}

impl std::fmt::Debug for ClaudeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeConfig")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Google OAuth client for refreshing GA4 tokens.
#[derive(Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
}

impl std::fmt::Debug for GoogleOAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleOAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("GHOST_DATABASE_URL")?;
        let host = get_env_or_default("GHOST_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("GHOST_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("GHOST_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("GHOST_PORT".to_string(), e.to_string()))?;
        let base_url = parse_base_url("GHOST_BASE_URL", &get_required_env("GHOST_BASE_URL")?)?;
        let app_url = match get_optional_env("GHOST_APP_URL") {
            Some(url) => parse_base_url("GHOST_APP_URL", &url)?,
            None => base_url.clone(),
        };

        let shopify = ShopifyAppConfig::from_env()?;
        let claude = ClaudeConfig::from_env()?;
        let google = GoogleOAuthConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            app_url,
            shopify,
            claude,
            google,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// OAuth redirect URI registered with the Shopify app.
    #[must_use]
    pub fn shopify_redirect_uri(&self) -> String {
        format!("{}/api/auth/shopify/callback", self.base_url)
    }
}

impl ShopifyAppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let scopes = parse_scopes(&get_env_or_default("SHOPIFY_SCOPES", DEFAULT_SHOPIFY_SCOPES));
        if scopes.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "SHOPIFY_SCOPES".to_string(),
                "at least one scope is required".to_string(),
            ));
        }

        Ok(Self {
            api_key: get_required_env("SHOPIFY_API_KEY")?,
            api_secret: get_validated_secret("SHOPIFY_API_SECRET")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
            scopes,
        })
    }
}

impl ClaudeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_validated_secret("ANTHROPIC_API_KEY")?,
            model: get_env_or_default("CLAUDE_MODEL", DEFAULT_CLAUDE_MODEL),
        })
    }
}

impl GoogleOAuthConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let client_id = get_optional_env("GOOGLE_CLIENT_ID");
        let client_secret = get_optional_env("GOOGLE_CLIENT_SECRET");

        match (client_id, client_secret) {
            (Some(id), Some(secret)) => {
                validate_secret_strength(&secret, "GOOGLE_CLIENT_SECRET")?;
                Ok(Some(Self {
                    client_id: id,
                    client_secret: SecretString::from(secret),
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "GOOGLE_*".to_string(),
                "Both GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set together".to_string(),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Validate an absolute http(s) URL and strip any trailing slash.
fn parse_base_url(var_name: &str, value: &str) -> Result<String, ConfigError> {
    let url = url::Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be an http or https URL".to_string(),
        ));
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the value issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("aaaaaaa").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("shpss_4f9a0c2be71d58a3") > 3.3);
    }

    #[test]
    fn test_placeholder_secrets_rejected() {
        for value in ["your-shopify-secret", "changeme123", "REPLACE_ME_PLEASE"] {
            let err = validate_secret_strength(value, "SHOPIFY_API_SECRET").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        }
    }

    #[test]
    fn test_low_entropy_rejected() {
        assert!(validate_secret_strength(&"a".repeat(40), "ANTHROPIC_API_KEY").is_err());
        assert!(validate_secret_strength("sk-ant-REDACTED", "ANTHROPIC_API_KEY").is_ok());
    }

    #[test]
    fn test_parse_scopes() {
        assert_eq!(
            parse_scopes(" read_orders, ,write_themes "),
            vec!["read_orders".to_string(), "write_themes".to_string()]
        );
        assert!(parse_scopes(" , ").is_empty());
    }

    #[test]
    fn test_parse_base_url() {
        assert_eq!(
            parse_base_url("GHOST_BASE_URL", "https://api.ghostcro.app/").unwrap(),
            "https://api.ghostcro.app"
        );
        assert!(parse_base_url("GHOST_BASE_URL", "ftp://x.test").is_err());
        assert!(parse_base_url("GHOST_BASE_URL", "not a url").is_err());
    }

    #[test]
    fn test_redirect_uri_and_socket_addr() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/ghost"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "https://api.ghostcro.app".to_string(),
            app_url: "https://ghostcro.app".to_string(),
            shopify: ShopifyAppConfig {
                api_key: "key".to_string(),
                api_secret: SecretString::from("secret"),
                api_version: DEFAULT_SHOPIFY_API_VERSION.to_string(),
                scopes: parse_scopes(DEFAULT_SHOPIFY_SCOPES),
            },
            claude: ClaudeConfig {
                api_key: SecretString::from("sk-ant-test"),
                model: DEFAULT_CLAUDE_MODEL.to_string(),
            },
            google: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        assert_eq!(
            config.shopify_redirect_uri(),
            "https://api.ghostcro.app/api/auth/shopify/callback"
        );
        assert_eq!(config.socket_addr().port(), 3000);
        assert_eq!(config.shopify.scopes.len(), 5);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let shopify = ShopifyAppConfig {
            api_key: "client-id-123".to_string(),
            api_secret: SecretString::from("shpss_super_secret_value"),
            api_version: "2025-01".to_string(),
            scopes: vec!["read_orders".to_string()],
        };
        let out = format!("{shopify:?}");
        assert!(out.contains("client-id-123"));
        assert!(out.contains("[REDACTED]"));
        assert!(!out.contains("shpss_super_secret_value"));

        let claude = ClaudeConfig {
            api_key: SecretString::from("sk-ant-super-secret-key"),
            model: DEFAULT_CLAUDE_MODEL.to_string(),
        };
        let out = format!("{claude:?}");
        assert!(out.contains(DEFAULT_CLAUDE_MODEL));
        assert!(!out.contains("sk-ant-super-secret-key"));
    }
}
