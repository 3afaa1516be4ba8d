//! `runReport` over a GA4 property.

use chrono::NaiveDate;
use ghost_cro_core::Ga4Metrics;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Ga4Client, Ga4Error, upstream_error};

const METRICS: [&str; 7] = [
    "sessions",
    "totalUsers",
    "ecommercePurchases",
    "purchaseRevenue",
    "addToCarts",
    "checkouts",
    "bounceRate",
];

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// The `days` days ending on `end`, inclusive.
    #[must_use]
    pub fn ending(end: NaiveDate, days: u32) -> Self {
        let start = end - chrono::Duration::days(i64::from(days.saturating_sub(1)));
        Self { start, end }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReportRequest {
    date_ranges: [ReportDateRange; 1],
    metrics: Vec<MetricName>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportDateRange {
    start_date: String,
    end_date: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MetricName {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunReportResponse {
    #[serde(default)]
    metric_headers: Vec<MetricName>,
    #[serde(default)]
    rows: Vec<ReportRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRow {
    metric_values: Vec<MetricValue>,
}

#[derive(Debug, Deserialize)]
struct MetricValue {
    value: String,
}

impl Ga4Client {
    /// Run the conversion report for `property_id` over `range`.
    ///
    /// # Errors
    ///
    /// Returns `Ga4Error::Upstream` with Google's message if the report is
    /// rejected.
    #[instrument(skip(self, access_token))]
    pub async fn run_report(
        &self,
        access_token: &str,
        property_id: &str,
        range: DateRange,
    ) -> Result<Ga4Metrics, Ga4Error> {
        let property = property_id.trim_start_matches("properties/");
        let url = format!("{}/properties/{property}:runReport", self.inner.data_api_url);

        let body = RunReportRequest {
            date_ranges: [ReportDateRange {
                start_date: range.start.to_string(),
                end_date: range.end.to_string(),
            }],
            metrics: METRICS
                .iter()
                .map(|name| MetricName {
                    name: (*name).to_string(),
                })
                .collect(),
        };

        let response = self
            .inner
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &text));
        }

        let report: RunReportResponse = serde_json::from_str(&text)?;
        Ok(metrics_from_report(&report, range))
    }
}

/// Build metrics from the first (and, without dimensions, only) row.
/// Missing or unparseable values count as zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn metrics_from_report(report: &RunReportResponse, range: DateRange) -> Ga4Metrics {
    let value = |name: &str| -> f64 {
        let Some(row) = report.rows.first() else {
            return 0.0;
        };
        report
            .metric_headers
            .iter()
            .position(|h| h.name == name)
            .and_then(|i| row.metric_values.get(i))
            .and_then(|v| v.value.parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    };
    let count = |name: &str| value(name).max(0.0).round() as u64;

    let mut metrics = Ga4Metrics {
        sessions: count("sessions"),
        total_users: count("totalUsers"),
        purchases: count("ecommercePurchases"),
        purchase_revenue: value("purchaseRevenue"),
        add_to_carts: count("addToCarts"),
        checkouts: count("checkouts"),
        bounce_rate: value("bounceRate"),
        start_date: range.start,
        end_date: range.end,
        ..Default::default()
    };
    metrics.calculate_ratios();
    metrics
}
