//! Aggregate store metrics from a window of orders.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::Order;
use crate::types::StoreMetrics;

/// Derive [`StoreMetrics`] from the orders placed over `period_days`.
///
/// Cancelled orders are ignored. Orders without a customer count toward
/// revenue but not toward the customer figures.
#[must_use]
// Order and customer counts stay far below f64's exact integer range
#[allow(clippy::cast_precision_loss)]
pub fn derive_store_metrics(orders: &[Order], period_days: u32) -> StoreMetrics {
    let mut revenue = Decimal::ZERO;
    let mut order_count = 0_u64;
    let mut per_customer: HashMap<i64, u64> = HashMap::new();
    let mut currency = None;

    for order in orders.iter().filter(|o| o.cancelled_at.is_none()) {
        order_count += 1;
        revenue += order.total_price;
        if currency.is_none() {
            currency.clone_from(&order.currency);
        }
        if let Some(customer) = &order.customer {
            *per_customer.entry(customer.id).or_insert(0) += 1;
        }
    }

    let total_revenue = revenue.to_f64().unwrap_or_default();
    let unique_customers = per_customer.len() as u64;
    let repeat = per_customer.values().filter(|&&n| n > 1).count() as u64;

    StoreMetrics {
        total_revenue,
        order_count,
        average_order_value: if order_count > 0 {
            total_revenue / order_count as f64
        } else {
            0.0
        },
        period_days,
        revenue_per_day: if period_days > 0 {
            total_revenue / f64::from(period_days)
        } else {
            0.0
        },
        unique_customers,
        repeat_customer_rate: if unique_customers > 0 {
            repeat as f64 / unique_customers as f64
        } else {
            0.0
        },
        currency,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::checkout::CustomerRef;

    fn order(id: i64, total: i64, customer: Option<i64>, cancelled: bool) -> Order {
        Order {
            id,
            created_at: Utc::now(),
            total_price: Decimal::new(total, 0),
            currency: Some("USD".to_string()),
            cancelled_at: cancelled.then(Utc::now),
            customer: customer.map(|id| CustomerRef { id }),
        }
    }

    #[test]
    fn metrics_from_orders() {
        let orders = vec![
            order(1, 100, Some(7), false),
            order(2, 50, Some(7), false),
            order(3, 150, Some(8), false),
            order(4, 900, Some(9), true),
            order(5, 100, None, false),
        ];

        let metrics = derive_store_metrics(&orders, 10);
        assert_eq!(metrics.order_count, 4);
        assert!((metrics.total_revenue - 400.0).abs() < 1e-9);
        assert!((metrics.average_order_value - 100.0).abs() < 1e-9);
        assert!((metrics.revenue_per_day - 40.0).abs() < 1e-9);
        assert_eq!(metrics.unique_customers, 2);
        assert!((metrics.repeat_customer_rate - 0.5).abs() < 1e-9);
        assert_eq!(metrics.currency.as_deref(), Some("USD"));
    }

    #[test]
    fn no_orders() {
        let metrics = derive_store_metrics(&[], 30);
        assert_eq!(metrics.order_count, 0);
        assert_eq!(metrics.period_days, 30);
        assert!(metrics.average_order_value.abs() < f64::EPSILON);
        assert!(metrics.currency.is_none());
    }
}
