//! Abandoned checkout statistics.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use super::AbandonedCheckout;

const TOP_PRODUCTS: usize = 5;

/// How far shoppers got before leaving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageBreakdown {
    /// Left before entering an email.
    pub contact: u64,
    /// Entered an email but no shipping address.
    pub shipping: u64,
    /// Entered a shipping address, left at payment.
    pub payment: u64,
}

/// A product frequently left behind in abandoned checkouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonedProduct {
    pub title: String,
    /// Number of abandoned checkouts containing the product.
    pub occurrences: u64,
}

/// Summary of a store's abandoned checkouts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbandonedCheckoutStats {
    pub total_abandoned: u64,
    pub recovered: u64,
    pub recovery_rate: f64,
    pub total_abandoned_value: f64,
    pub average_abandoned_value: f64,
    /// Abandoned / (abandoned + completed orders).
    pub abandonment_rate: f64,
    pub stages: StageBreakdown,
    pub top_abandoned_products: Vec<AbandonedProduct>,
}

/// Summarize abandoned checkouts against the number of completed orders.
///
/// Recovered checkouts count toward `total_abandoned` and `recovered`, but
/// not toward the abandoned value or the stage breakdown.
#[must_use]
// Counts stay far below f64's exact integer range
#[allow(clippy::cast_precision_loss)]
pub fn calculate_abandoned_checkout_stats(
    checkouts: &[AbandonedCheckout],
    completed_orders: u64,
) -> AbandonedCheckoutStats {
    if checkouts.is_empty() {
        return AbandonedCheckoutStats::default();
    }

    let total = checkouts.len() as u64;
    let mut recovered = 0_u64;
    let mut lost_value = Decimal::ZERO;
    let mut lost = 0_u64;
    let mut stages = StageBreakdown::default();
    let mut products: HashMap<&str, u64> = HashMap::new();

    for checkout in checkouts {
        if checkout.completed_at.is_some() {
            recovered += 1;
            continue;
        }

        lost += 1;
        lost_value += checkout.total_price;

        if checkout.has_shipping_address() {
            stages.payment += 1;
        } else if checkout.has_email() {
            stages.shipping += 1;
        } else {
            stages.contact += 1;
        }

        let mut seen: Vec<&str> = Vec::with_capacity(checkout.line_items.len());
        for item in &checkout.line_items {
            let title = item.title.as_str();
            if !seen.contains(&title) {
                seen.push(title);
                *products.entry(title).or_insert(0) += 1;
            }
        }
    }

    let mut top: Vec<AbandonedProduct> = products
        .into_iter()
        .map(|(title, occurrences)| AbandonedProduct {
            title: title.to_string(),
            occurrences,
        })
        .collect();
    top.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.title.cmp(&b.title))
    });
    top.truncate(TOP_PRODUCTS);

    let total_value = lost_value.to_f64().unwrap_or_default();

    AbandonedCheckoutStats {
        total_abandoned: total,
        recovered,
        recovery_rate: recovered as f64 / total as f64,
        total_abandoned_value: total_value,
        average_abandoned_value: if lost > 0 {
            total_value / lost as f64
        } else {
            0.0
        },
        abandonment_rate: total as f64 / (total + completed_orders) as f64,
        stages,
        top_abandoned_products: top,
    }
}
