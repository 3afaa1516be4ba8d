//! HMAC verification for Shopify callbacks.
//!
//! Webhooks carry a base64 HMAC-SHA256 of the raw body in
//! `X-Shopify-Hmac-Sha256`. OAuth redirects carry a hex HMAC of the other
//! query parameters, sorted by key and joined as `k=v&k=v`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const HMAC_HEADER: &str = "x-shopify-hmac-sha256";
/// Header carrying the webhook topic, e.g. `app/uninstalled`.
pub const TOPIC_HEADER: &str = "x-shopify-topic";
/// Header carrying the shop domain that sent the webhook.
pub const SHOP_HEADER: &str = "x-shopify-shop-domain";

fn sign(secret: &str, message: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Verify a webhook body against its base64 `X-Shopify-Hmac-Sha256` value.
#[must_use]
pub fn verify_webhook_hmac(secret: &str, body: &[u8], provided: &str) -> bool {
    let Some(expected) = sign(secret, body) else {
        return false;
    };
    let expected = STANDARD.encode(expected);
    constant_time_compare(&expected, provided.trim())
}

/// Verify the `hmac` parameter of an OAuth redirect.
///
/// `params` are the decoded query pairs in any order; `hmac` and `signature`
/// are excluded from the signed message.
#[must_use]
pub fn verify_oauth_hmac(secret: &str, params: &[(String, String)]) -> bool {
    let Some(provided) = params.iter().find(|(k, _)| k == "hmac").map(|(_, v)| v) else {
        return false;
    };

    let mut pairs: Vec<_> = params
        .iter()
        .filter(|(k, _)| k != "hmac" && k != "signature")
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let message = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let Some(expected) = sign(secret, message.as_bytes()) else {
        return false;
    };
    constant_time_compare(&hex::encode(expected), &provided.to_ascii_lowercase())
}

/// Compare two strings without short-circuiting on the first difference.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "hush";

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn webhook_signature_round_trip() {
        let body = br#"{"id":1,"domain":"acme.myshopify.com"}"#;
        let header = STANDARD.encode(sign(SECRET, body).unwrap());

        assert!(verify_webhook_hmac(SECRET, body, &header));
        assert!(!verify_webhook_hmac(SECRET, b"{}", &header));
        assert!(!verify_webhook_hmac("other", body, &header));
        assert!(!verify_webhook_hmac(SECRET, body, ""));
    }

    #[test]
    fn oauth_signature_ignores_order_and_signature_param() {
        let message = "code=abc&shop=acme.myshopify.com&state=s1&timestamp=1700000000";
        let hmac = hex::encode(sign(SECRET, message.as_bytes()).unwrap());

        let params = pairs(&[
            ("timestamp", "1700000000"),
            ("hmac", &hmac),
            ("shop", "acme.myshopify.com"),
            ("signature", "legacy"),
            ("state", "s1"),
            ("code", "abc"),
        ]);
        assert!(verify_oauth_hmac(SECRET, &params));
    }

    #[test]
    fn oauth_signature_rejects_tampering() {
        let message = "code=abc&shop=acme.myshopify.com";
        let hmac = hex::encode(sign(SECRET, message.as_bytes()).unwrap());

        let tampered = pairs(&[("code", "abc"), ("shop", "evil.myshopify.com"), ("hmac", &hmac)]);
        assert!(!verify_oauth_hmac(SECRET, &tampered));

        let missing = pairs(&[("code", "abc"), ("shop", "acme.myshopify.com")]);
        assert!(!verify_oauth_hmac(SECRET, &missing));
    }

    #[test]
    fn compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "ab"));
    }
}
