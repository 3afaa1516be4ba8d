//! Checkout test results produced by a persona simulation run.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::persona::PersonaMix;

/// Matches the first percentage in a free-form impact string ("-12% conversions").
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d+(?:\.\d+)?)\s*%").expect("Invalid regex"));

/// Upper bound on the abandonment impact attributed to a single friction point.
pub const MAX_SINGLE_IMPACT: f64 = 0.25;

/// Severity bucket of a friction point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Self; 3] = [Self::Critical, Self::High, Self::Medium];

    /// Abandonment impact assumed when a friction point carries no explicit percentage.
    #[must_use]
    pub const fn default_impact(self) -> f64 {
        match self {
            Self::Critical => 0.08,
            Self::High => 0.04,
            Self::Medium => 0.015,
        }
    }

    /// Lowercase label, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

/// Outcome a simulated shopper reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Purchase,
    Abandon,
}

/// Lifecycle of a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl TestStatus {
    /// Lowercase label, as serialized and stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// An identified checkout UX issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrictionPoint {
    /// Short title ("Surprise shipping cost").
    pub title: String,
    /// Where in the funnel the issue occurs ("Checkout - shipping step").
    pub location: String,
    /// Human-readable impact estimate ("-12% conversions").
    pub impact: String,
    /// Shopper segment most affected ("Mobile first-time buyers").
    pub affected_segment: String,
    /// Suggested fix.
    pub fix: String,
}

impl FrictionPoint {
    /// Estimated fraction of checkouts lost to this issue.
    ///
    /// Uses the first percentage in `impact` when present (absolute value,
    /// capped at [`MAX_SINGLE_IMPACT`]), otherwise the severity default.
    #[must_use]
    pub fn estimated_impact(&self, severity: Severity) -> f64 {
        PERCENT_RE
            .captures(&self.impact)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|pct| pct.is_finite())
            .map_or_else(
                || severity.default_impact(),
                |pct| (pct.abs() / 100.0).min(MAX_SINGLE_IMPACT),
            )
    }
}

/// Friction points bucketed by severity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrictionPoints {
    #[serde(default)]
    pub critical: Vec<FrictionPoint>,
    #[serde(default)]
    pub high: Vec<FrictionPoint>,
    #[serde(default)]
    pub medium: Vec<FrictionPoint>,
}

impl FrictionPoints {
    /// Friction points in the given bucket.
    #[must_use]
    pub fn bucket(&self, severity: Severity) -> &[FrictionPoint] {
        match severity {
            Severity::Critical => &self.critical,
            Severity::High => &self.high,
            Severity::Medium => &self.medium,
        }
    }

    /// Number of friction points in the given bucket.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.bucket(severity).len()
    }

    /// Total number of friction points.
    #[must_use]
    pub fn total(&self) -> usize {
        self.critical.len() + self.high.len() + self.medium.len()
    }

    /// Iterate over every friction point with its severity, most severe first.
    pub fn iter(&self) -> impl Iterator<Item = (Severity, &FrictionPoint)> {
        Severity::ALL
            .into_iter()
            .flat_map(move |severity| self.bucket(severity).iter().map(move |fp| (severity, fp)))
    }

    /// Issue counts summary.
    #[must_use]
    pub fn issue_counts(&self) -> IssueCounts {
        IssueCounts {
            critical: self.critical.len(),
            high: self.high.len(),
            medium: self.medium.len(),
            total: self.total(),
        }
    }
}

/// Number of issues found per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub total: usize,
}

/// The verdict of one synthetic shopper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaResult {
    /// Synthetic shopper name ("Maya, 28").
    pub name: String,
    /// Demographics summary.
    pub demographics: String,
    pub verdict: Verdict,
    /// Why the shopper bought or left.
    pub reasoning: String,
    /// Funnel step where the shopper abandoned, if they did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abandon_point: Option<String>,
}

/// Funnel counts across the simulated shoppers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunnelCounts {
    pub landed: u32,
    pub cart: u32,
    pub checkout: u32,
    pub purchased: u32,
}

/// Step-to-step conversion rates of a funnel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelRates {
    pub landed_to_cart: f64,
    pub cart_to_checkout: f64,
    pub checkout_to_purchase: f64,
}

impl FunnelCounts {
    /// Conversion rate of each funnel step; zero when the previous step is empty.
    #[must_use]
    pub fn stage_rates(&self) -> FunnelRates {
        fn rate(num: u32, den: u32) -> f64 {
            if den == 0 {
                0.0
            } else {
                f64::from(num) / f64::from(den)
            }
        }

        FunnelRates {
            landed_to_cart: rate(self.cart, self.landed),
            cart_to_checkout: rate(self.checkout, self.cart),
            checkout_to_purchase: rate(self.purchased, self.checkout),
        }
    }
}

/// The full report of a checkout test run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: Uuid,
    /// Store URL that was tested.
    pub url: String,
    pub persona_mix: PersonaMix,
    #[serde(default)]
    pub status: TestStatus,
    /// Ghost Score, 0-100.
    pub score: u8,
    pub issues: IssueCounts,
    pub friction_points: FrictionPoints,
    #[serde(default)]
    pub personas: Vec<PersonaResult>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub funnel: FunnelCounts,
    pub created_at: DateTime<Utc>,
    /// Connected store, when the run was made for one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
}

impl TestResult {
    /// Whether the run finished and its numbers can be trusted.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TestStatus::Completed
    }

    /// Fraction of simulated shoppers who purchased.
    #[must_use]
    pub fn purchase_rate(&self) -> f64 {
        if self.personas.is_empty() {
            return 0.0;
        }
        let purchased = self
            .personas
            .iter()
            .filter(|p| p.verdict == Verdict::Purchase)
            .count();
        #[allow(clippy::cast_precision_loss)] // persona lists hold a handful of entries
        let rate = purchased as f64 / self.personas.len() as f64;
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friction(impact: &str) -> FrictionPoint {
        FrictionPoint {
            title: "Hidden shipping".to_string(),
            location: "checkout".to_string(),
            impact: impact.to_string(),
            affected_segment: "all".to_string(),
            fix: "show shipping early".to_string(),
        }
    }

    #[test]
    fn impact_parses_percentage() {
        let fp = friction("-12% conversions");
        assert!((fp.estimated_impact(Severity::Medium) - 0.12).abs() < 1e-9);
    }

    #[test]
    fn impact_parses_decimal_percentage() {
        let fp = friction("roughly 7.5 % of mobile shoppers");
        assert!((fp.estimated_impact(Severity::High) - 0.075).abs() < 1e-9);
    }

    #[test]
    fn impact_falls_back_to_severity() {
        let fp = friction("significant");
        assert!((fp.estimated_impact(Severity::Critical) - 0.08).abs() < 1e-9);
        assert!((fp.estimated_impact(Severity::Medium) - 0.015).abs() < 1e-9);
    }

    #[test]
    fn impact_is_capped() {
        let fp = friction("-90% checkout completion");
        assert!((fp.estimated_impact(Severity::Critical) - MAX_SINGLE_IMPACT).abs() < 1e-9);
    }

    #[test]
    fn friction_points_iterate_in_severity_order() {
        let points = FrictionPoints {
            critical: vec![friction("1%")],
            high: vec![],
            medium: vec![friction("2%"), friction("3%")],
        };
        let severities: Vec<Severity> = points.iter().map(|(s, _)| s).collect();
        assert_eq!(
            severities,
            vec![Severity::Critical, Severity::Medium, Severity::Medium]
        );
        assert_eq!(points.total(), 3);
        assert_eq!(points.issue_counts().medium, 2);
    }

    #[test]
    fn funnel_rates_handle_empty_steps() {
        let funnel = FunnelCounts {
            landed: 5,
            cart: 0,
            checkout: 0,
            purchased: 0,
        };
        let rates = funnel.stage_rates();
        assert!(rates.landed_to_cart.abs() < f64::EPSILON);
        assert!(rates.cart_to_checkout.abs() < f64::EPSILON);
    }

    #[test]
    fn funnel_rates() {
        let funnel = FunnelCounts {
            landed: 5,
            cart: 4,
            checkout: 2,
            purchased: 1,
        };
        let rates = funnel.stage_rates();
        assert!((rates.landed_to_cart - 0.8).abs() < 1e-9);
        assert!((rates.cart_to_checkout - 0.5).abs() < 1e-9);
        assert!((rates.checkout_to_purchase - 0.5).abs() < 1e-9);
    }

    #[test]
    fn persona_result_uses_camel_case() {
        let json = r#"{
            "name": "Maya",
            "demographics": "28, mobile",
            "verdict": "abandon",
            "reasoning": "shipping too expensive",
            "abandonPoint": "shipping"
        }"#;
        let persona: PersonaResult = serde_json::from_str(json).expect("deserialize");
        assert_eq!(persona.verdict, Verdict::Abandon);
        assert_eq!(persona.abandon_point.as_deref(), Some("shipping"));
    }
}
