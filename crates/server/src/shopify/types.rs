//! Shopify REST payload types not shared with the core crate.
//!
//! Orders, checkouts and shipping zones deserialize straight into the
//! `ghost_cro_core::checkout` records.

use serde::{Deserialize, Serialize};

/// Offline access token returned by the OAuth code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    /// Comma-separated granted scopes.
    pub scope: String,
}

/// Role of a theme in the online store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeRole {
    /// The published theme.
    Main,
    Unpublished,
    Demo,
    Development,
    #[serde(other)]
    Other,
}

/// An online store theme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: i64,
    pub name: String,
    pub role: ThemeRole,
}

/// A theme file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub key: String,
    /// Text content; absent for binary assets.
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OrdersEnvelope {
    pub orders: Vec<ghost_cro_core::checkout::Order>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CheckoutsEnvelope {
    pub checkouts: Vec<ghost_cro_core::checkout::AbandonedCheckout>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ShippingZonesEnvelope {
    pub shipping_zones: Vec<ghost_cro_core::checkout::ShippingZone>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ThemesEnvelope {
    pub themes: Vec<Theme>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct AssetEnvelope {
    pub asset: Asset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_roles_deserialize() {
        let themes: ThemesEnvelope = serde_json::from_str(
            r#"{"themes":[
                {"id":1,"name":"Dawn","role":"main"},
                {"id":2,"name":"Copy","role":"unpublished"},
                {"id":3,"name":"Odd","role":"archived"}
            ]}"#,
        )
        .expect("deserialize");
        let roles: Vec<_> = themes.themes.iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![ThemeRole::Main, ThemeRole::Unpublished, ThemeRole::Other]);
    }
}
