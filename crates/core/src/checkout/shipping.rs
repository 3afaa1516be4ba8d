//! Shipping shock: abandonment driven by shipping cost revealed at checkout.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::{AbandonedCheckout, ShippingZone};

/// Shipping at or above this share of the subtotal shocks shoppers.
const SHOCK_PCT: f64 = 0.15;
/// Shipping at or above this absolute amount shocks shoppers.
const SHOCK_AMOUNT: f64 = 15.0;
/// Carts within this fraction below the free-shipping threshold are "close".
const NEAR_THRESHOLD: f64 = 0.20;

/// How strongly shipping cost drives abandonment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShockSeverity {
    None,
    Low,
    Medium,
    High,
}

impl ShockSeverity {
    fn from_rate(rate: f64) -> Self {
        if rate >= 0.4 {
            Self::High
        } else if rate >= 0.2 {
            Self::Medium
        } else if rate > 0.0 {
            Self::Low
        } else {
            Self::None
        }
    }
}

/// Result of [`analyze_shipping_shock`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingShockAnalysis {
    pub checkouts_analyzed: u64,
    pub with_shipping_info: u64,
    pub shock_count: u64,
    /// Shocked checkouts / checkouts with shipping info.
    pub shock_rate: f64,
    pub average_shipping_cost: f64,
    /// Average shipping cost as a fraction of the subtotal.
    pub average_shipping_pct: f64,
    pub average_cart_value: f64,
    /// Lowest subtotal that unlocks free shipping in any zone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_shipping_threshold: Option<f64>,
    pub severity: ShockSeverity,
    pub recommendation: String,
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// Analyze shipping cost against cart value across abandoned checkouts.
///
/// Only unrecovered checkouts with at least one shipping line and a positive
/// subtotal contribute to the averages.
#[must_use]
// Counts stay far below f64's exact integer range
#[allow(clippy::cast_precision_loss)]
pub fn analyze_shipping_shock(
    checkouts: &[AbandonedCheckout],
    zones: &[ShippingZone],
) -> ShippingShockAnalysis {
    let mut analyzed = 0_u64;
    let mut with_info = 0_u64;
    let mut shocked = 0_u64;
    let mut shipping_total = 0.0;
    let mut pct_total = 0.0;
    let mut cart_total = 0.0;

    for checkout in checkouts.iter().filter(|c| c.completed_at.is_none()) {
        analyzed += 1;
        let subtotal = to_f64(checkout.subtotal_price);
        let Some(shipping) = checkout.shipping_cost().map(to_f64) else {
            continue;
        };
        if subtotal <= 0.0 {
            continue;
        }

        with_info += 1;
        let pct = shipping / subtotal;
        shipping_total += shipping;
        pct_total += pct;
        cart_total += subtotal;

        if pct >= SHOCK_PCT || shipping >= SHOCK_AMOUNT {
            shocked += 1;
        }
    }

    let threshold = zones
        .iter()
        .filter_map(ShippingZone::free_shipping_threshold)
        .filter(|t| t.is_sign_positive() && !t.is_zero())
        .min()
        .map(to_f64);

    let average = |total: f64| {
        if with_info > 0 {
            total / with_info as f64
        } else {
            0.0
        }
    };

    let shock_rate = average(shocked as f64);
    let average_cart_value = average(cart_total);
    let severity = ShockSeverity::from_rate(shock_rate);

    ShippingShockAnalysis {
        checkouts_analyzed: analyzed,
        with_shipping_info: with_info,
        shock_count: shocked,
        shock_rate,
        average_shipping_cost: average(shipping_total),
        average_shipping_pct: average(pct_total),
        average_cart_value,
        free_shipping_threshold: threshold,
        severity,
        recommendation: recommend(severity, average_cart_value, threshold),
    }
}

fn recommend(severity: ShockSeverity, average_cart: f64, threshold: Option<f64>) -> String {
    if let Some(threshold) = threshold {
        let gap = threshold - average_cart;
        if gap > 0.0 && gap <= threshold * NEAR_THRESHOLD {
            return format!(
                "Average abandoned cart is {gap:.2} short of free shipping at {threshold:.2}. \
                 Show a progress bar toward the threshold in the cart and checkout."
            );
        }
    }

    match (severity, threshold) {
        (ShockSeverity::None, _) => "Shipping cost is not a significant abandonment driver.".to_string(),
        (ShockSeverity::Low, _) => {
            "Show estimated shipping on product and cart pages to avoid late surprises.".to_string()
        }
        (_, None) => "Shipping cost is driving abandonment. Introduce a free-shipping threshold \
                      slightly above your average order value, or build shipping into prices."
            .to_string(),
        (_, Some(threshold)) => format!(
            "Shipping cost is driving abandonment. Advertise free shipping over {threshold:.2} \
             site-wide and show the shipping estimate before checkout."
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::checkout::{ShippingLine, ShippingRate};

    fn checkout(subtotal: i64, shipping: Option<i64>, completed: bool) -> AbandonedCheckout {
        AbandonedCheckout {
            id: 1,
            email: None,
            created_at: Utc::now(),
            completed_at: completed.then(Utc::now),
            subtotal_price: Decimal::new(subtotal, 0),
            total_price: Decimal::new(subtotal + shipping.unwrap_or(0), 0),
            shipping_lines: shipping
                .map(|price| {
                    vec![ShippingLine {
                        title: Some("Standard".to_string()),
                        price: Decimal::new(price, 0),
                    }]
                })
                .unwrap_or_default(),
            shipping_address: None,
            line_items: vec![],
        }
    }

    fn zone_with_free_over(threshold: i64) -> ShippingZone {
        ShippingZone {
            name: "Domestic".to_string(),
            price_based_shipping_rates: vec![ShippingRate {
                name: "Free".to_string(),
                price: Decimal::ZERO,
                min_order_subtotal: Some(Decimal::new(threshold, 0)),
                max_order_subtotal: None,
            }],
            weight_based_shipping_rates: vec![],
        }
    }

    #[test]
    fn no_checkouts() {
        let analysis = analyze_shipping_shock(&[], &[]);
        assert_eq!(analysis.checkouts_analyzed, 0);
        assert_eq!(analysis.severity, ShockSeverity::None);
        assert!(analysis.shock_rate.abs() < f64::EPSILON);
    }

    #[test]
    fn detects_shock_by_percentage_and_amount() {
        let checkouts = vec![
            checkout(40, Some(8), false),   // 20% -> shock
            checkout(200, Some(16), false), // 8% but >= 15 -> shock
            checkout(100, Some(5), false),  // fine
            checkout(100, None, false),     // no shipping info
            checkout(50, Some(20), true),   // recovered, ignored
        ];
        let analysis = analyze_shipping_shock(&checkouts, &[]);
        assert_eq!(analysis.checkouts_analyzed, 4);
        assert_eq!(analysis.with_shipping_info, 3);
        assert_eq!(analysis.shock_count, 2);
        assert!((analysis.shock_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(analysis.severity, ShockSeverity::High);
        assert!(analysis.recommendation.contains("free-shipping threshold"));
    }

    #[test]
    fn near_threshold_recommendation() {
        let checkouts = vec![checkout(70, Some(12), false), checkout(66, Some(12), false)];
        let analysis = analyze_shipping_shock(&checkouts, &[zone_with_free_over(75)]);
        assert_eq!(analysis.free_shipping_threshold, Some(75.0));
        assert!((analysis.average_cart_value - 68.0).abs() < 1e-9);
        assert!(analysis.recommendation.contains("short of free shipping"));
    }

    #[test]
    fn severity_bands() {
        assert_eq!(ShockSeverity::from_rate(0.0), ShockSeverity::None);
        assert_eq!(ShockSeverity::from_rate(0.1), ShockSeverity::Low);
        assert_eq!(ShockSeverity::from_rate(0.2), ShockSeverity::Medium);
        assert_eq!(ShockSeverity::from_rate(0.5), ShockSeverity::High);
    }
}
