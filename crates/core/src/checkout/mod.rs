//! Checkout analysis over Shopify order and checkout records.
//!
//! The record types deserialize directly from the Shopify REST Admin API
//! (snake_case JSON, money as decimal strings). Only the fields the analysis
//! needs are modelled; everything else in the payload is ignored.

pub mod abandoned;
pub mod shipping;
pub mod store_metrics;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub use abandoned::{
    AbandonedCheckoutStats, AbandonedProduct, StageBreakdown, calculate_abandoned_checkout_stats,
};
pub use shipping::{ShippingShockAnalysis, ShockSeverity, analyze_shipping_shock};
pub use store_metrics::derive_store_metrics;

/// Customer reference on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerRef {
    pub id: i64,
}

/// A completed Shopify order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub total_price: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
}

/// A shipping line selected on a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingLine {
    #[serde(default)]
    pub title: Option<String>,
    pub price: Decimal,
}

/// A product line on a checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLineItem {
    pub title: String,
    #[serde(default)]
    pub product_id: Option<i64>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// A Shopify abandoned checkout.
///
/// `completed_at` is set when the shopper came back and finished the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbandonedCheckout {
    pub id: i64,
    #[serde(default)]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub subtotal_price: Decimal,
    pub total_price: Decimal,
    #[serde(default)]
    pub shipping_lines: Vec<ShippingLine>,
    /// Raw address object; only its presence matters here.
    #[serde(default)]
    pub shipping_address: Option<serde_json::Value>,
    #[serde(default)]
    pub line_items: Vec<CheckoutLineItem>,
}

impl AbandonedCheckout {
    /// Sum of the shipping lines, if any were selected.
    #[must_use]
    pub fn shipping_cost(&self) -> Option<Decimal> {
        if self.shipping_lines.is_empty() {
            None
        } else {
            Some(self.shipping_lines.iter().map(|l| l.price).sum())
        }
    }

    /// Whether the shopper reached the payment step.
    #[must_use]
    pub fn has_shipping_address(&self) -> bool {
        self.shipping_address
            .as_ref()
            .is_some_and(|v| v.as_object().is_some_and(|o| !o.is_empty()))
    }

    /// Whether the shopper entered an email.
    #[must_use]
    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }
}

/// A price-based shipping rate within a zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingRate {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub min_order_subtotal: Option<Decimal>,
    #[serde(default)]
    pub max_order_subtotal: Option<Decimal>,
}

/// A Shopify shipping zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingZone {
    pub name: String,
    #[serde(default)]
    pub price_based_shipping_rates: Vec<ShippingRate>,
    #[serde(default)]
    pub weight_based_shipping_rates: Vec<ShippingRate>,
}

impl ShippingZone {
    /// Lowest order subtotal that unlocks a free rate in this zone.
    ///
    /// Free rates without a positive minimum are unconditional and do not
    /// set a threshold.
    #[must_use]
    pub fn free_shipping_threshold(&self) -> Option<Decimal> {
        self.price_based_shipping_rates
            .iter()
            .filter(|rate| rate.price.is_zero())
            .filter_map(|rate| rate.min_order_subtotal)
            .filter(|min| min.is_sign_positive() && !min.is_zero())
            .min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_deserializes_from_shopify_payload() {
        let json = r#"{
            "id": 1001,
            "email": "maya@example.com",
            "created_at": "2026-03-01T10:00:00-05:00",
            "completed_at": null,
            "subtotal_price": "80.00",
            "total_price": "92.50",
            "shipping_lines": [{"title": "Standard", "price": "12.50"}],
            "shipping_address": {"city": "Toronto"},
            "line_items": [{"title": "Linen Shirt", "product_id": 42, "quantity": 2}],
            "token": "ignored"
        }"#;
        let checkout: AbandonedCheckout = serde_json::from_str(json).expect("deserialize");
        assert_eq!(checkout.shipping_cost(), Some(Decimal::new(1250, 2)));
        assert!(checkout.has_shipping_address());
        assert!(checkout.has_email());
        assert_eq!(checkout.line_items[0].quantity, 2);
    }

    #[test]
    fn empty_address_object_does_not_count() {
        let json = r#"{
            "id": 1,
            "created_at": "2026-03-01T10:00:00Z",
            "subtotal_price": "10.00",
            "total_price": "10.00",
            "shipping_address": {}
        }"#;
        let checkout: AbandonedCheckout = serde_json::from_str(json).expect("deserialize");
        assert!(!checkout.has_shipping_address());
        assert!(!checkout.has_email());
        assert_eq!(checkout.shipping_cost(), None);
    }

    #[test]
    fn free_threshold_picks_lowest_free_rate() {
        let zone = ShippingZone {
            name: "Domestic".to_string(),
            price_based_shipping_rates: vec![
                ShippingRate {
                    name: "Standard".to_string(),
                    price: Decimal::new(799, 2),
                    min_order_subtotal: None,
                    max_order_subtotal: Some(Decimal::new(75, 0)),
                },
                ShippingRate {
                    name: "Free over 75".to_string(),
                    price: Decimal::ZERO,
                    min_order_subtotal: Some(Decimal::new(75, 0)),
                    max_order_subtotal: None,
                },
            ],
            weight_based_shipping_rates: vec![],
        };
        assert_eq!(zone.free_shipping_threshold(), Some(Decimal::new(75, 0)));
    }

    #[test]
    fn unconditional_free_rate_does_not_hide_threshold() {
        let rate = |name: &str, min: Option<Decimal>| ShippingRate {
            name: name.to_string(),
            price: Decimal::ZERO,
            min_order_subtotal: min,
            max_order_subtotal: None,
        };
        let zone = ShippingZone {
            name: "Domestic".to_string(),
            price_based_shipping_rates: vec![
                rate("Local pickup", None),
                rate("Promo", Some(Decimal::ZERO)),
                rate("Free over 75", Some(Decimal::new(75, 0))),
            ],
            weight_based_shipping_rates: vec![],
        };
        assert_eq!(zone.free_shipping_threshold(), Some(Decimal::new(75, 0)));

        let only_pickup = ShippingZone {
            price_based_shipping_rates: vec![rate("Local pickup", None)],
            ..zone
        };
        assert_eq!(only_pickup.free_shipping_threshold(), None);
    }
}
