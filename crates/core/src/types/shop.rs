//! Shopify shop domain type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ShopDomain`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShopDomainError {
    /// The input string is empty.
    #[error("shop domain cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("shop domain must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The domain is not a `myshopify.com` subdomain.
    #[error("shop domain must end with .myshopify.com")]
    NotMyshopify,
    /// The store handle contains characters Shopify does not allow.
    #[error("shop handle may only contain letters, digits and hyphens")]
    InvalidHandle,
}

/// A Shopify shop domain (e.g., `acme-goods.myshopify.com`).
///
/// ## Constraints
///
/// - Length: 1-255 characters
/// - Lowercased on parse
/// - Must be `<handle>.myshopify.com`, where the handle starts with a letter
///   or digit and contains only letters, digits and hyphens
///
/// ## Examples
///
/// ```
/// use ghost_cro_core::ShopDomain;
///
/// assert!(ShopDomain::parse("acme-goods.myshopify.com").is_ok());
/// assert!(ShopDomain::parse("ACME.myshopify.com").is_ok());
///
/// assert!(ShopDomain::parse("").is_err());
/// assert!(ShopDomain::parse("acme.com").is_err());
/// assert!(ShopDomain::parse("-acme.myshopify.com").is_err());
/// assert!(ShopDomain::parse("evil.com/.myshopify.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
    /// Maximum length of a shop domain.
    pub const MAX_LENGTH: usize = 255;

    const SUFFIX: &'static str = ".myshopify.com";

    /// Parse a `ShopDomain` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, not a
    /// `myshopify.com` subdomain, or has an invalid handle.
    pub fn parse(s: &str) -> Result<Self, ShopDomainError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ShopDomainError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ShopDomainError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        let lower = s.to_ascii_lowercase();
        let handle = lower
            .strip_suffix(Self::SUFFIX)
            .ok_or(ShopDomainError::NotMyshopify)?;

        let mut chars = handle.chars();
        let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphanumeric());
        if !first_ok || !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ShopDomainError::InvalidHandle);
        }

        Ok(Self(lower))
    }

    /// Returns the full domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the store handle (the part before `.myshopify.com`).
    #[must_use]
    pub fn handle(&self) -> &str {
        self.0.strip_suffix(Self::SUFFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ShopDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ShopDomain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ShopDomain {
    type Error = ShopDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ShopDomain> for String {
    fn from(value: ShopDomain) -> Self {
        value.0
    }
}
