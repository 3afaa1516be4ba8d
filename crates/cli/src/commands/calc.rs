//! Offline calculations: revenue opportunity and percentile.
//!
//! Same functions the API serves, for quick what-if numbers without a
//! running server.

use ghost_cro_core::benchmarks::Category;
use ghost_cro_core::calculations::{
    OpportunityInput, RevenueOpportunity, ScoreBand, calculate_percentile_benchmark,
    calculate_revenue_opportunity,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CalcError {
    #[error(transparent)]
    UnknownCategory(#[from] ghost_cro_core::benchmarks::UnknownCategory),

    #[error("score must be between 0 and 100, got {0}")]
    ScoreOutOfRange(f64),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where the benchmark conversion rate comes from.
#[derive(Debug, Clone)]
pub enum BenchmarkSource {
    Rate(f64),
    Category(String),
}

impl BenchmarkSource {
    fn resolve(&self) -> Result<f64, CalcError> {
        match self {
            Self::Rate(rate) => Ok(*rate),
            Self::Category(name) => Ok(name.parse::<Category>()?.benchmark().conversion_rate),
        }
    }
}

/// Compute the opportunity for the given store numbers.
///
/// # Errors
///
/// Returns an error if the category name is unknown.
pub fn opportunity(
    visitors: f64,
    conversion_rate: f64,
    aov: f64,
    benchmark: &BenchmarkSource,
) -> Result<RevenueOpportunity, CalcError> {
    let input = OpportunityInput {
        monthly_visitors: visitors,
        current_conversion_rate: conversion_rate,
        aov,
        category_benchmark_cr: benchmark.resolve()?,
    };
    Ok(calculate_revenue_opportunity(&input))
}

/// Print the opportunity as pretty JSON.
///
/// # Errors
///
/// Returns an error if the category is unknown.
pub fn print_opportunity(
    visitors: f64,
    conversion_rate: f64,
    aov: f64,
    benchmark: &BenchmarkSource,
) -> Result<(), CalcError> {
    let result = opportunity(visitors, conversion_rate, aov, benchmark)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

/// Print the percentile and band for a Ghost Score.
///
/// # Errors
///
/// Returns an error if the score is outside 0-100.
pub fn print_percentile(score: f64) -> Result<(), CalcError> {
    if !(0.0..=100.0).contains(&score) {
        return Err(CalcError::ScoreOutOfRange(score));
    }
    let percentile = calculate_percentile_benchmark(score);

    // In range, so the cast cannot truncate.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let band = ScoreBand::from_score(score.round() as u8);

    #[allow(clippy::print_stdout)]
    {
        println!("score {score}: {percentile}th percentile ({band:?})");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn category_resolves_to_benchmark_rate() {
        let source = BenchmarkSource::Category("home & garden".to_string());
        assert!((source.resolve().unwrap() - 0.016).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_category_errors() {
        let source = BenchmarkSource::Category("spaceships".to_string());
        assert!(matches!(
            source.resolve(),
            Err(CalcError::UnknownCategory(_))
        ));
    }

    #[test]
    fn explicit_rate_opportunity() {
        let result = opportunity(10_000.0, 0.01, 100.0, &BenchmarkSource::Rate(0.02)).unwrap();
        assert!((result.current_monthly_revenue - 10_000.0).abs() < 1e-9);
        assert!((result.potential_monthly_revenue - 20_000.0).abs() < 1e-9);
        assert!((result.monthly_opportunity.min - 2_500.0).abs() < 1e-9);
        assert!((result.monthly_opportunity.max - 6_000.0).abs() < 1e-9);
    }

    #[test]
    fn score_out_of_range() {
        assert!(print_percentile(101.0).is_err());
        assert!(print_percentile(-1.0).is_err());
    }
}
