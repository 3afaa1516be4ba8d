//! Revenue opportunity from closing the gap to the category conversion rate.

use serde::{Deserialize, Serialize};

use super::{non_negative, round_cents, saturating_mul};

/// Share of the conversion gap a store can realistically recover (low end).
pub const RECOVERABLE_MIN: f64 = 0.25;
/// Share of the conversion gap a store can realistically recover (high end).
pub const RECOVERABLE_MAX: f64 = 0.60;

/// Inputs to [`calculate_revenue_opportunity`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityInput {
    pub monthly_visitors: f64,
    pub current_conversion_rate: f64,
    pub aov: f64,
    #[serde(rename = "categoryBenchmarkCR")]
    pub category_benchmark_cr: f64,
}

/// A min/max money range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRange {
    pub min: f64,
    pub max: f64,
}

impl OpportunityRange {
    fn scaled(self, factor: f64) -> Self {
        Self {
            min: round_cents(saturating_mul(self.min, factor)),
            max: round_cents(saturating_mul(self.max, factor)),
        }
    }
}

/// Revenue a store leaves on the table versus its category benchmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueOpportunity {
    pub current_monthly_revenue: f64,
    pub potential_monthly_revenue: f64,
    pub monthly_opportunity: OpportunityRange,
    pub annual_opportunity: OpportunityRange,
    /// Conversion-rate points between the store and its benchmark (never negative).
    pub conversion_gap: f64,
}

/// Calculate the monthly and annual revenue opportunity.
///
/// Negative or non-finite inputs are treated as zero. A store already above
/// its benchmark has a potential equal to its current revenue and no
/// opportunity.
#[must_use]
pub fn calculate_revenue_opportunity(input: &OpportunityInput) -> RevenueOpportunity {
    let visitors = non_negative(input.monthly_visitors);
    let current_cr = non_negative(input.current_conversion_rate);
    let aov = non_negative(input.aov);
    let benchmark_cr = non_negative(input.category_benchmark_cr).max(current_cr);

    let current = saturating_mul(saturating_mul(visitors, current_cr), aov);
    let potential = saturating_mul(saturating_mul(visitors, benchmark_cr), aov);
    let gap = (potential - current).max(0.0);

    let monthly = OpportunityRange {
        min: round_cents(gap * RECOVERABLE_MIN),
        max: round_cents(gap * RECOVERABLE_MAX),
    };

    RevenueOpportunity {
        current_monthly_revenue: round_cents(current),
        potential_monthly_revenue: round_cents(potential),
        monthly_opportunity: monthly,
        annual_opportunity: monthly.scaled(12.0),
        conversion_gap: benchmark_cr - current_cr,
    }
}
