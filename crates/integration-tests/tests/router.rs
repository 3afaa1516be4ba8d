//! Router-level tests: status codes, headers and webhook verification.
//!
//! Every case here answers before the handler touches the database.

#![allow(clippy::unwrap_used)]

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use ghost_cro_integration_tests::{TEST_CLIENT_IP, sign_oauth, sign_webhook, test_app};
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(request: Request<Body>) -> Response {
    test_app().oneshot(request).await.unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri)
        .header("x-forwarded-for", TEST_CLIENT_IP)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header("x-forwarded-for", TEST_CLIENT_IP)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

// ============================================================================
// Health and middleware
// ============================================================================

#[tokio::test]
async fn health_is_ok() {
    let response = send(get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn security_headers_and_request_id() {
    let request = Request::get("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = send(request).await;

    let headers = response.headers();
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("x-request-id").unwrap(), "req-123");
}

#[tokio::test]
async fn request_id_generated_when_absent() {
    let response = send(get("/health")).await;
    let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(id.len(), 36);
}

// ============================================================================
// Calculations
// ============================================================================

#[tokio::test]
async fn benchmark_for_known_category() {
    let response = send(get("/api/benchmarks/fashion")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["category"], "fashion");
    assert_eq!(body["conversionRate"], 0.019);
    assert!(body.get("comparison").is_none());
}

#[tokio::test]
async fn benchmark_compares_store_numbers() {
    let response =
        send(get("/api/benchmarks/fashion?conversionRate=0.03&cartAbandonmentRate=0.9")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let comparison = body["comparison"].as_array().unwrap();
    assert_eq!(comparison.len(), 2);
    assert_eq!(comparison[0]["metric"], "conversionRate");
    assert_eq!(comparison[0]["status"], "above");
    assert_eq!(comparison[1]["metric"], "cartAbandonmentRate");
    assert_eq!(comparison[1]["status"], "below");
}

#[tokio::test]
async fn benchmark_rejects_non_numeric_query() {
    let response = send(get("/api/benchmarks/fashion?aov=lots")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn benchmark_for_unknown_category_is_404() {
    let response = send(get("/api/benchmarks/spaceships")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn opportunity_calculation() {
    let response = send(post_json(
        "/api/calculations/opportunity",
        &json!({
            "monthlyVisitors": 10000.0,
            "currentConversionRate": 0.01,
            "aov": 100.0,
            "categoryBenchmarkCR": 0.02
        }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["currentMonthlyRevenue"], 10000.0);
    assert_eq!(body["potentialMonthlyRevenue"], 20000.0);
    assert_eq!(body["monthlyOpportunity"]["min"], 2500.0);
    assert_eq!(body["monthlyOpportunity"]["max"], 6000.0);
    assert_eq!(body["annualOpportunity"]["max"], 72000.0);
}

#[tokio::test]
async fn opportunity_rejects_malformed_body() {
    let response = send(post_json(
        "/api/calculations/opportunity",
        &json!({ "monthlyVisitors": "lots" }),
    ))
    .await;
    assert!(response.status().is_client_error());
}

// ============================================================================
// Webhooks
// ============================================================================

fn webhook(topic: &str, shop: Option<&str>, body: &str, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::post("/api/shopify/webhooks")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-shopify-topic", topic);
    if let Some(shop) = shop {
        builder = builder.header("x-shopify-shop-domain", shop);
    }
    if let Some(signature) = signature {
        builder = builder.header("x-shopify-hmac-sha256", signature);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn webhook_without_signature_is_401() {
    let response = send(webhook("app/uninstalled", Some("acme.myshopify.com"), "{}", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_with_wrong_signature_is_401() {
    let body = r#"{"id":1}"#;
    let forged = sign_webhook(b"something else");
    let response = send(webhook(
        "app/uninstalled",
        Some("acme.myshopify.com"),
        body,
        Some(forged),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_without_shop_is_400() {
    let body = "{}";
    let response = send(webhook(
        "customers/redact",
        None,
        body,
        Some(sign_webhook(body.as_bytes())),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn compliance_webhooks_acknowledged() {
    for topic in ["customers/data_request", "customers/redact", "shop/redact"] {
        let body = r#"{"shop_domain":"acme.myshopify.com"}"#;
        let response = send(webhook(
            topic,
            Some("acme.myshopify.com"),
            body,
            Some(sign_webhook(body.as_bytes())),
        ))
        .await;
        assert_eq!(response.status(), StatusCode::OK, "topic {topic}");
        assert_eq!(json_body(response).await, json!({ "received": true }));
    }
}

#[tokio::test]
async fn unknown_webhook_topic_acknowledged() {
    let body = r#"{"id":42}"#;
    let response = send(webhook(
        "products/update",
        Some("acme.myshopify.com"),
        body,
        Some(sign_webhook(body.as_bytes())),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_subscription_update_is_400() {
    let body = r#"{"unexpected":true}"#;
    let response = send(webhook(
        "app_subscriptions/update",
        Some("acme.myshopify.com"),
        body,
        Some(sign_webhook(body.as_bytes())),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stripe_webhook_acknowledges() {
    let response = send(post_json("/api/stripe/webhook", &json!({ "type": "invoice.paid" }))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["received"], true);
}

// ============================================================================
// Shopify install
// ============================================================================

#[tokio::test]
async fn install_requires_shop() {
    let response = send(get("/api/auth/shopify")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn install_rejects_foreign_domain() {
    let response = send(get("/api/auth/shopify?shop=evil.example.com")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn callback_denied_redirects_with_error() {
    let response = send(get(
        "/api/auth/shopify/callback?error=access_denied&error_description=nope",
    ))
    .await;
    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response),
        "http://localhost:5173/dashboard?error=oauth_denied"
    );
}

#[tokio::test]
async fn callback_with_bad_hmac_redirects_with_error() {
    let response = send(get(
        "/api/auth/shopify/callback?code=abc&shop=acme.myshopify.com&state=s&timestamp=1&hmac=00",
    ))
    .await;
    assert!(location(&response).ends_with("error=invalid_hmac"));
}

#[tokio::test]
async fn callback_without_session_state_is_rejected() {
    let params = [
        ("code", "abc"),
        ("shop", "acme.myshopify.com"),
        ("state", "not-in-session"),
        ("timestamp", "1700000000"),
    ];
    let hmac = sign_oauth(&params);
    let query: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .chain(std::iter::once(format!("hmac={hmac}")))
        .collect();

    let response = send(get(&format!(
        "/api/auth/shopify/callback?{}",
        query.join("&")
    )))
    .await;
    assert!(location(&response).ends_with("error=invalid_state"));
}

// ============================================================================
// Validation before upstream calls
// ============================================================================

#[tokio::test]
async fn ga4_requires_credentials_or_store() {
    let response = send(post_json("/api/analytics/ga4", &json!({ "propertyId": "123" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ga4_rejects_inverted_range() {
    let response = send(post_json(
        "/api/analytics/ga4",
        &json!({ "storeId": "acme.myshopify.com", "startDate": "2026-03-10", "endDate": "2026-03-01" }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_requires_url() {
    let response = send(post_json("/api/analyze", &json!({ "url": "  " }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_rejects_unknown_persona_mix() {
    let response = send(post_json(
        "/api/analyze",
        &json!({ "url": "acme.example", "personaMix": "aliens" }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn metrics_rejects_invalid_shop() {
    let response = send(post_json("/api/shopify/metrics", &json!({ "shop": "not a shop" }))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Store-bound routes need the session that connected the store
// ============================================================================

#[tokio::test]
async fn metrics_requires_merchant_session() {
    let response = send(post_json(
        "/api/shopify/metrics",
        &json!({ "shop": "acme.myshopify.com", "days": 30 }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sandbox_requires_merchant_session() {
    let response = send(post_json(
        "/api/shopify/sandbox",
        &json!({
            "shop": "acme.myshopify.com",
            "injections": [{ "id": "shipping-banner", "kind": "css", "content": "a{}" }]
        }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn store_reports_require_merchant_session() {
    let response = send(get("/api/stores/acme.myshopify.com/reports")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ga4_store_connection_requires_merchant_session() {
    let response = send(post_json(
        "/api/analytics/ga4",
        &json!({ "storeId": "acme.myshopify.com" }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn analyze_for_store_requires_merchant_session() {
    let response = send(post_json(
        "/api/analyze",
        &json!({ "url": "acme.example", "storeId": "acme.myshopify.com" }),
    ))
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
