//! Persona-simulation analysis of a store's checkout.
//!
//! The model is asked for a strict JSON object:
//!
//! ```json
//! {
//!   "frictionPoints": {"critical": [...], "high": [...], "medium": [...]},
//!   "personas": [{"name", "demographics", "verdict", "reasoning", "abandonPoint"}],
//!   "recommendations": ["..."],
//!   "funnel": {"landed", "cart", "checkout", "purchased"}
//! }
//! ```
//!
//! Any score the model offers is ignored; the Ghost Score is recomputed
//! from the friction counts.

use std::fmt::Write as _;

use chrono::Utc;
use ghost_cro_core::benchmarks::Category;
use ghost_cro_core::calculations::{RevenueBaseline, ghost_score};
use ghost_cro_core::{
    FrictionPoints, FunnelCounts, PersonaMix, PersonaResult, TestResult, TestStatus,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::types::Message;
use super::{ClaudeClient, ClaudeError};

const SYSTEM_PROMPT: &str = "You are a senior e-commerce conversion analyst. \
You simulate real shoppers moving through a Shopify store's checkout and report \
the friction they hit. Respond with a single JSON object and nothing else.";

/// What to analyze.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub url: String,
    pub persona_mix: PersonaMix,
    pub category: Category,
    /// Traffic numbers to ground the simulation, when known.
    pub baseline: Option<RevenueBaseline>,
    /// Connected store the run belongs to.
    pub store: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisResponse {
    #[serde(default)]
    friction_points: FrictionPoints,
    #[serde(default)]
    personas: Vec<PersonaResult>,
    #[serde(default)]
    recommendations: Vec<String>,
    #[serde(default)]
    funnel: Option<FunnelCounts>,
}

/// Run an analysis and return the completed test result.
///
/// # Errors
///
/// Returns the client error if the API call fails, or
/// `ClaudeError::Parse` if the answer holds no usable JSON object.
#[instrument(skip(client, request), fields(url = %request.url, persona_mix = %request.persona_mix))]
pub async fn analyze_store(
    client: &ClaudeClient,
    request: &AnalysisRequest,
) -> Result<TestResult, ClaudeError> {
    let prompt = build_prompt(request);
    let response = client
        .chat(vec![Message::user(prompt)], Some(SYSTEM_PROMPT.to_string()))
        .await?;

    let text = response
        .first_text()
        .ok_or_else(|| ClaudeError::Parse("response has no text block".to_string()))?;

    let result = parse_analysis(text, request)?;
    tracing::info!(
        score = result.score,
        issues = result.issues.total,
        "Analysis completed"
    );
    Ok(result)
}

fn build_prompt(request: &AnalysisRequest) -> String {
    let mut prompt = format!(
        "Store URL: {}\nStore category: {}\n\nSimulate these five shoppers ({} mix):\n",
        request.url, request.category, request.persona_mix
    );

    for persona in request.persona_mix.personas() {
        let device = match persona.device {
            ghost_cro_core::Device::Mobile => "mobile",
            ghost_cro_core::Device::Desktop => "desktop",
            ghost_cro_core::Device::Tablet => "tablet",
        };
        let _ = writeln!(
            prompt,
            "- {} ({}, {device}): {}",
            persona.name, persona.demographics, persona.motivation
        );
    }

    if let Some(baseline) = &request.baseline {
        let _ = write!(
            prompt,
            "\nStore metrics: {:.0} monthly visitors, {:.2}% conversion rate, {:.2} average order value.\n",
            baseline.monthly_visitors,
            baseline.conversion_rate * 100.0,
            baseline.aov
        );
    }

    prompt.push_str(
        "\nReturn JSON with keys frictionPoints (object with critical, high and medium arrays \
of {title, location, impact, affectedSegment, fix}), personas (array of {name, demographics, \
verdict: purchase|abandon, reasoning, abandonPoint}), recommendations (array of strings) and \
funnel ({landed, cart, checkout, purchased} counts over the five shoppers).",
    );
    prompt
}

/// Parse the model's answer into a completed result for `request`.
fn parse_analysis(text: &str, request: &AnalysisRequest) -> Result<TestResult, ClaudeError> {
    let json = extract_json_object(text)
        .ok_or_else(|| ClaudeError::Parse("no JSON object in response".to_string()))?;

    let parsed: AnalysisResponse = serde_json::from_str(json)
        .map_err(|e| ClaudeError::Parse(format!("analysis JSON: {e}")))?;

    let funnel = parsed.funnel.unwrap_or_else(|| funnel_from_personas(&parsed.personas));

    Ok(TestResult {
        id: Uuid::new_v4(),
        url: request.url.clone(),
        persona_mix: request.persona_mix,
        status: TestStatus::Completed,
        score: ghost_score(&parsed.friction_points),
        issues: parsed.friction_points.issue_counts(),
        friction_points: parsed.friction_points,
        personas: parsed.personas,
        recommendations: parsed.recommendations,
        funnel,
        created_at: Utc::now(),
        store: request.store.clone(),
    })
}

/// Strip Markdown code fences and return the outermost `{...}` span.
fn extract_json_object(text: &str) -> Option<&str> {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string ("json") on the opening fence line.
        body = rest.split_once('\n').map_or(rest, |(_, after)| after);
        body = body.trim_end().strip_suffix("```").unwrap_or(body);
    }

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    body.get(start..=end)
}

/// Without a reported funnel, everyone landed and the verdicts decide the rest.
fn funnel_from_personas(personas: &[PersonaResult]) -> FunnelCounts {
    let landed = u32::try_from(personas.len()).unwrap_or(u32::MAX);
    let purchased = u32::try_from(
        personas
            .iter()
            .filter(|p| p.verdict == ghost_cro_core::Verdict::Purchase)
            .count(),
    )
    .unwrap_or(u32::MAX);

    FunnelCounts {
        landed,
        cart: landed,
        checkout: landed,
        purchased,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            url: "https://acme.example".to_string(),
            persona_mix: PersonaMix::Mobile,
            category: Category::Fashion,
            baseline: None,
            store: Some("acme.myshopify.com".to_string()),
        }
    }

    const ANSWER: &str = r#"{
        "score": 99,
        "frictionPoints": {
            "critical": [{"title": "Forced account creation", "location": "Checkout",
                          "impact": "-18% conversions", "affectedSegment": "First-time buyers",
                          "fix": "Enable guest checkout"}],
            "high": [{"title": "Shipping revealed late", "location": "Shipping step",
                      "impact": "-9%", "affectedSegment": "Budget shoppers",
                      "fix": "Show shipping on product page"}],
            "medium": []
        },
        "personas": [
            {"name": "Maya", "demographics": "28", "verdict": "abandon",
             "reasoning": "Had to sign up", "abandonPoint": "Account step"},
            {"name": "Robert", "demographics": "54", "verdict": "purchase",
             "reasoning": "Smooth"}
        ],
        "recommendations": ["Enable guest checkout"],
        "funnel": {"landed": 5, "cart": 4, "checkout": 3, "purchased": 1}
    }"#;

    #[test]
    fn extracts_from_fenced_block() {
        let text = format!("```json\n{ANSWER}\n```");
        assert_eq!(extract_json_object(&text), Some(ANSWER.trim()));
    }

    #[test]
    fn extracts_from_surrounding_prose() {
        let text = format!("Here is the analysis:\n{ANSWER}\nLet me know!");
        assert_eq!(extract_json_object(&text), Some(ANSWER.trim()));
        assert_eq!(extract_json_object("no json here"), None);
    }

    #[test]
    fn score_is_recomputed() {
        let result = parse_analysis(ANSWER, &request()).unwrap();
        assert_eq!(result.score, 100 - 15 - 8);
        assert_eq!(result.issues.total, 2);
        assert_eq!(result.status, TestStatus::Completed);
        assert_eq!(result.funnel.purchased, 1);
        assert_eq!(result.persona_mix, PersonaMix::Mobile);
        assert_eq!(result.store.as_deref(), Some("acme.myshopify.com"));
    }

    #[test]
    fn funnel_defaults_from_verdicts() {
        let answer = r#"{"personas": [
            {"name": "A", "demographics": "", "verdict": "purchase", "reasoning": ""},
            {"name": "B", "demographics": "", "verdict": "abandon", "reasoning": ""}
        ]}"#;
        let result = parse_analysis(answer, &request()).unwrap();
        assert_eq!(result.funnel.landed, 2);
        assert_eq!(result.funnel.purchased, 1);
        assert_eq!(result.score, 100);
    }

    #[test]
    fn malformed_answer_is_parse_error() {
        let err = parse_analysis("{\"personas\": 3}", &request()).unwrap_err();
        assert!(matches!(err, ClaudeError::Parse(_)));
    }

    #[test]
    fn prompt_lists_every_persona() {
        let mut req = request();
        req.baseline = Some(RevenueBaseline::default());
        let prompt = build_prompt(&req);
        for persona in PersonaMix::Mobile.personas() {
            assert!(prompt.contains(persona.name));
        }
        assert!(prompt.contains("2.50% conversion rate"));
        assert!(prompt.contains("fashion"));
    }
}
