//! Aggregate metric bags pulled from Shopify and Google Analytics 4.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Store performance derived from Shopify orders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetrics {
    /// Revenue across non-cancelled orders in the period.
    pub total_revenue: f64,
    /// Number of non-cancelled orders.
    pub order_count: u64,
    pub average_order_value: f64,
    /// Length of the period the orders were fetched for.
    pub period_days: u32,
    pub revenue_per_day: f64,
    pub unique_customers: u64,
    /// Fraction of identified customers with more than one order.
    pub repeat_customer_rate: f64,
    /// ISO 4217 code of the first order seen, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl StoreMetrics {
    /// Revenue projected over a 30-day month.
    #[must_use]
    pub fn monthly_revenue(&self) -> f64 {
        self.revenue_per_day * 30.0
    }
}

/// Traffic and e-commerce metrics from a GA4 property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ga4Metrics {
    pub sessions: u64,
    pub total_users: u64,
    pub purchases: u64,
    pub purchase_revenue: f64,
    /// Purchases per session.
    pub conversion_rate: f64,
    pub average_order_value: f64,
    pub add_to_carts: u64,
    pub checkouts: u64,
    /// Fraction of sessions that bounced.
    pub bounce_rate: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Ga4Metrics {
    /// Fill the derived ratios from the raw counts.
    // Session counts will never exceed f64's exact integer range (2^52)
    #[allow(clippy::cast_precision_loss)]
    pub fn calculate_ratios(&mut self) {
        self.conversion_rate = if self.sessions > 0 {
            self.purchases as f64 / self.sessions as f64
        } else {
            0.0
        };
        self.average_order_value = if self.purchases > 0 {
            self.purchase_revenue / self.purchases as f64
        } else {
            0.0
        };
    }

    /// Cart-to-checkout abandonment observed in GA4 (0 when no carts).
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn cart_abandonment_rate(&self) -> f64 {
        if self.add_to_carts == 0 {
            return 0.0;
        }
        let completed = self.purchases.min(self.add_to_carts);
        1.0 - completed as f64 / self.add_to_carts as f64
    }
}
