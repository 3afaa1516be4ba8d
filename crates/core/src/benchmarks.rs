//! Category conversion benchmarks.
//!
//! Industry reference numbers per store category, and a comparison of a
//! store's own numbers against them.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Store category used to pick a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Fashion,
    Beauty,
    Electronics,
    HomeGarden,
    FoodBeverage,
    HealthWellness,
    Jewelry,
    SportsOutdoors,
    #[default]
    General,
}

/// Reference numbers for a category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBenchmark {
    pub category: Category,
    pub conversion_rate: f64,
    pub aov: f64,
    pub cart_abandonment_rate: f64,
    pub mobile_conversion_rate: f64,
}

/// Error returned when a category name is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown store category: {0}")]
pub struct UnknownCategory(pub String);

impl Category {
    pub const ALL: [Self; 9] = [
        Self::Fashion,
        Self::Beauty,
        Self::Electronics,
        Self::HomeGarden,
        Self::FoodBeverage,
        Self::HealthWellness,
        Self::Jewelry,
        Self::SportsOutdoors,
        Self::General,
    ];

    /// Snake-case name, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fashion => "fashion",
            Self::Beauty => "beauty",
            Self::Electronics => "electronics",
            Self::HomeGarden => "home_garden",
            Self::FoodBeverage => "food_beverage",
            Self::HealthWellness => "health_wellness",
            Self::Jewelry => "jewelry",
            Self::SportsOutdoors => "sports_outdoors",
            Self::General => "general",
        }
    }

    /// Parse leniently, falling back to [`Category::General`].
    #[must_use]
    pub fn parse_or_general(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Benchmark numbers for this category.
    #[must_use]
    pub const fn benchmark(self) -> CategoryBenchmark {
        let (conversion_rate, aov, cart_abandonment_rate, mobile_conversion_rate) = match self {
            Self::Fashion => (0.019, 92.0, 0.72, 0.015),
            Self::Beauty => (0.027, 61.0, 0.68, 0.022),
            Self::Electronics => (0.012, 215.0, 0.75, 0.009),
            Self::HomeGarden => (0.016, 128.0, 0.73, 0.012),
            Self::FoodBeverage => (0.031, 54.0, 0.64, 0.026),
            Self::HealthWellness => (0.025, 68.0, 0.67, 0.020),
            Self::Jewelry => (0.011, 178.0, 0.77, 0.008),
            Self::SportsOutdoors => (0.018, 104.0, 0.71, 0.014),
            Self::General => (0.020, 85.0, 0.70, 0.016),
        };
        CategoryBenchmark {
            category: self,
            conversion_rate,
            aov,
            cart_abandonment_rate,
            mobile_conversion_rate,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' ', '&'], "_");
        let normalized = normalized
            .split('_')
            .filter(|part| !part.is_empty() && *part != "and")
            .collect::<Vec<_>>()
            .join("_");

        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// Where a store sits relative to its benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    Above,
    At,
    Below,
}

/// Tolerance, as a relative delta, within which a store is "at" benchmark.
const AT_BENCHMARK_TOLERANCE: f64 = 0.05;

/// Store numbers to compare against a benchmark. Missing numbers are skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub conversion_rate: Option<f64>,
    pub aov: Option<f64>,
    pub cart_abandonment_rate: Option<f64>,
}

/// Comparison of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricComparison {
    pub metric: &'static str,
    pub store_value: f64,
    pub benchmark: f64,
    /// Signed relative difference in percent ((store - benchmark) / benchmark).
    pub delta_pct: f64,
    pub status: BenchmarkStatus,
}

fn compare(metric: &'static str, store: f64, benchmark: f64, lower_is_better: bool) -> MetricComparison {
    let delta = if benchmark.abs() > f64::EPSILON {
        (store - benchmark) / benchmark
    } else {
        0.0
    };
    let effective = if lower_is_better { -delta } else { delta };
    let status = if effective > AT_BENCHMARK_TOLERANCE {
        BenchmarkStatus::Above
    } else if effective < -AT_BENCHMARK_TOLERANCE {
        BenchmarkStatus::Below
    } else {
        BenchmarkStatus::At
    };

    MetricComparison {
        metric,
        store_value: store,
        benchmark,
        delta_pct: (delta * 10_000.0).round() / 100.0,
        status,
    }
}

/// Compare a store's numbers against its category benchmark.
///
/// `Above` always means "better than benchmark": for cart abandonment a lower
/// store value is reported as above.
#[must_use]
pub fn compare_to_benchmark(store: &StoreSnapshot, category: Category) -> Vec<MetricComparison> {
    let bench = category.benchmark();
    [
        store
            .conversion_rate
            .map(|v| compare("conversionRate", v, bench.conversion_rate, false)),
        store.aov.map(|v| compare("aov", v, bench.aov, false)),
        store
            .cart_abandonment_rate
            .map(|v| compare("cartAbandonmentRate", v, bench.cart_abandonment_rate, true)),
    ]
    .into_iter()
    .flatten()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parsing() {
        assert_eq!("Home & Garden".parse::<Category>(), Ok(Category::HomeGarden));
        assert_eq!("food-beverage".parse::<Category>(), Ok(Category::FoodBeverage));
        assert_eq!("SPORTS_OUTDOORS".parse::<Category>(), Ok(Category::SportsOutdoors));
        assert_eq!("health and wellness".parse::<Category>(), Ok(Category::HealthWellness));
    }

    #[test]
    fn unknown_falls_back_to_general() {
        assert!("pet supplies".parse::<Category>().is_err());
        assert_eq!(Category::parse_or_general("pet supplies"), Category::General);
    }

    #[test]
    fn every_benchmark_is_sane() {
        for category in Category::ALL {
            let b = category.benchmark();
            assert!(b.conversion_rate > 0.0 && b.conversion_rate < 0.1);
            assert!(b.mobile_conversion_rate <= b.conversion_rate);
            assert!(b.cart_abandonment_rate > 0.5 && b.cart_abandonment_rate < 1.0);
            assert!(b.aov > 0.0);
        }
    }

    #[test]
    fn comparison_statuses() {
        let snapshot = StoreSnapshot {
            conversion_rate: Some(0.03),
            aov: Some(85.0),
            cart_abandonment_rate: Some(0.80),
        };
        let result = compare_to_benchmark(&snapshot, Category::General);
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].status, BenchmarkStatus::Above);
        assert!((result[0].delta_pct - 50.0).abs() < 1e-9);
        assert_eq!(result[1].status, BenchmarkStatus::At);
        // higher abandonment than benchmark is worse
        assert_eq!(result[2].status, BenchmarkStatus::Below);
    }

    #[test]
    fn missing_metrics_are_skipped() {
        let snapshot = StoreSnapshot {
            aov: Some(40.0),
            ..Default::default()
        };
        let result = compare_to_benchmark(&snapshot, Category::Electronics);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].metric, "aov");
        assert_eq!(result[0].status, BenchmarkStatus::Below);
    }
}
