//! Revenue and score calculations.
//!
//! Every function here is pure: plain numbers in, plain numbers out. Rates are
//! fractions (`0.025` is 2.5 %) and money is in the store's currency units.

pub mod leak;
pub mod opportunity;
pub mod percentile;
pub mod score;

pub use leak::{RevenueBaseline, RevenueLeak, SeverityLeak, calculate_revenue_leak};
pub use opportunity::{
    OpportunityInput, OpportunityRange, RevenueOpportunity, calculate_revenue_opportunity,
};
pub use percentile::calculate_percentile_benchmark;
pub use score::{ScoreBand, ghost_score};

/// Round a money amount to cents.
pub(crate) fn round_cents(value: f64) -> f64 {
    let cents = value * 100.0;
    if cents.is_finite() {
        cents.round() / 100.0
    } else {
        value
    }
}

/// Multiply non-negative finite values, saturating at `f64::MAX` instead of
/// overflowing to infinity.
pub(crate) fn saturating_mul(a: f64, b: f64) -> f64 {
    (a * b).min(f64::MAX)
}

/// Clamp negative, NaN and infinite inputs to zero.
pub(crate) fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
