//! Revenue leak: what detected checkout friction is costing a store.

use serde::{Deserialize, Serialize};

use super::{non_negative, round_cents, saturating_mul};
use crate::types::{Severity, TestResult};

/// Upper bound on the combined abandonment impact of all friction points.
pub const MAX_TOTAL_IMPACT: f64 = 0.50;

const DAYS_PER_MONTH: f64 = 30.0;

/// Traffic baseline used to estimate a store's current revenue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBaseline {
    pub monthly_visitors: f64,
    pub conversion_rate: f64,
    pub aov: f64,
    /// Observed monthly revenue; preferred over the traffic estimate when positive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_revenue: Option<f64>,
}

impl Default for RevenueBaseline {
    fn default() -> Self {
        Self {
            monthly_visitors: 10_000.0,
            conversion_rate: 0.025,
            aov: 75.0,
            monthly_revenue: None,
        }
    }
}

impl RevenueBaseline {
    /// Estimated current monthly revenue.
    #[must_use]
    pub fn current_monthly_revenue(&self) -> f64 {
        match self.monthly_revenue.map(non_negative) {
            Some(observed) if observed > 0.0 => observed,
            _ => {
                let sessions = non_negative(self.monthly_visitors);
                let orders = saturating_mul(sessions, non_negative(self.conversion_rate));
                saturating_mul(orders, non_negative(self.aov))
            }
        }
    }
}

/// Monthly leak attributed to one severity bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityLeak {
    pub severity: Severity,
    pub monthly: f64,
}

/// Modeled revenue lost to detected friction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueLeak {
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
    pub annual: f64,
    /// Leak as a percentage of estimated current revenue (0-50).
    pub leak_percentage: f64,
    pub estimated_monthly_revenue: f64,
    pub by_severity: Vec<SeverityLeak>,
}

/// Calculate the revenue leak implied by a test result.
///
/// Returns an all-zero leak unless the result is present and completed.
/// The combined impact of all friction points is clamped to
/// [`MAX_TOTAL_IMPACT`]; when clamping applies the per-severity breakdown is
/// scaled down proportionally.
#[must_use]
pub fn calculate_revenue_leak(
    test_result: Option<&TestResult>,
    baseline: &RevenueBaseline,
) -> RevenueLeak {
    let Some(result) = test_result.filter(|r| r.is_completed()) else {
        return RevenueLeak::default();
    };

    let current = baseline.current_monthly_revenue();

    let raw: Vec<(Severity, f64)> = Severity::ALL
        .into_iter()
        .map(|severity| {
            let impact = result
                .friction_points
                .bucket(severity)
                .iter()
                .map(|fp| fp.estimated_impact(severity))
                .sum::<f64>();
            (severity, impact)
        })
        .collect();

    let raw_total: f64 = raw.iter().map(|(_, impact)| impact).sum();
    let total = raw_total.min(MAX_TOTAL_IMPACT);
    let scale = if raw_total > 0.0 { total / raw_total } else { 0.0 };

    let monthly = current * total;
    let daily = monthly / DAYS_PER_MONTH;

    RevenueLeak {
        daily: round_cents(daily),
        weekly: round_cents(daily * 7.0),
        monthly: round_cents(monthly),
        annual: round_cents(saturating_mul(monthly, 12.0)),
        leak_percentage: (total * 10_000.0).round() / 100.0,
        estimated_monthly_revenue: round_cents(current),
        by_severity: raw
            .into_iter()
            .map(|(severity, impact)| SeverityLeak {
                severity,
                monthly: round_cents(current * impact * scale),
            })
            .collect(),
    }
}
