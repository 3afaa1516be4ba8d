//! Theme sandbox: preview fixes on an unpublished copy of the live theme.

use axum::{Json, Router, extract::State, routing::post};
use chrono::Utc;
use ghost_cro_core::sandbox::{Injection, InjectionOutcome, inject};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::MerchantSession;
use crate::state::AppState;

use super::{connected_store, parse_shop};

/// Theme file the fixes are spliced into.
pub const LAYOUT_ASSET: &str = "layout/theme.liquid";
const MAX_INJECTIONS: usize = 20;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/shopify/sandbox", post(create_sandbox))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxRequest {
    pub shop: String,
    pub injections: Vec<Injection>,
    pub theme_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedInjection {
    pub id: String,
    pub outcome: InjectionOutcome,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxResponse {
    pub theme_id: i64,
    pub theme_name: String,
    pub source_theme_id: i64,
    pub asset: &'static str,
    pub injections: Vec<AppliedInjection>,
}

/// Apply every injection in order, reporting where each landed.
fn apply_all(
    source: &str,
    injections: &[Injection],
) -> Result<(String, Vec<AppliedInjection>), AppError> {
    let mut current = source.to_string();
    let mut applied = Vec::with_capacity(injections.len());

    for injection in injections {
        let injected = inject(&current, injection)?;
        applied.push(AppliedInjection {
            id: injection.id.clone(),
            outcome: injected.outcome,
        });
        current = injected.source;
    }

    Ok((current, applied))
}

/// POST /api/shopify/sandbox
#[instrument(skip(state, merchant, request), fields(shop = %request.shop, count = request.injections.len()))]
async fn create_sandbox(
    State(state): State<AppState>,
    merchant: MerchantSession,
    Json(request): Json<SandboxRequest>,
) -> Result<Json<SandboxResponse>, AppError> {
    let shop = parse_shop(&request.shop)?;
    merchant.authorize(&shop)?;
    if request.injections.is_empty() {
        return Err(AppError::BadRequest("no injections given".to_string()));
    }
    if request.injections.len() > MAX_INJECTIONS {
        return Err(AppError::BadRequest(format!(
            "at most {MAX_INJECTIONS} injections per sandbox"
        )));
    }
    // Reject bad ids and content before creating anything in the store.
    apply_all("", &request.injections)?;

    let token = connected_store(&state, &shop).await?;
    let client = state.shopify();

    let live = client.main_theme(&shop, &token).await?;
    let layout = client
        .get_asset(&shop, &token, live.id, LAYOUT_ASSET)
        .await?;

    let name = request.theme_name.unwrap_or_else(|| {
        format!("Ghost CRO Sandbox {}", Utc::now().format("%Y-%m-%d %H:%M"))
    });
    let sandbox = client.duplicate_theme(&shop, &token, live.id, &name).await?;

    let (patched, applied) = apply_all(&layout, &request.injections)?;
    client
        .put_asset(&shop, &token, sandbox.id, LAYOUT_ASSET, &patched)
        .await?;

    tracing::info!(
        theme_id = sandbox.id,
        source_theme_id = live.id,
        "Sandbox theme created"
    );

    Ok(Json(SandboxResponse {
        theme_id: sandbox.id,
        theme_name: sandbox.name,
        source_theme_id: live.id,
        asset: LAYOUT_ASSET,
        injections: applied,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ghost_cro_core::sandbox::InjectionKind;

    use super::*;

    fn injection(id: &str, kind: InjectionKind) -> Injection {
        Injection {
            id: id.to_string(),
            kind,
            content: "x".to_string(),
        }
    }

    #[test]
    fn applies_in_order() {
        let layout = "<html><head></head><body>{{ content_for_layout }}</body></html>";
        let (patched, applied) = apply_all(
            layout,
            &[
                injection("trust-badges", InjectionKind::Css),
                injection("sticky-cart", InjectionKind::Js),
            ],
        )
        .unwrap();

        assert_eq!(applied[0].outcome, InjectionOutcome::HeadClose);
        assert_eq!(applied[1].outcome, InjectionOutcome::BodyClose);
        assert!(patched.contains("ghost-cro:begin trust-badges"));
        assert!(patched.contains("ghost-cro:begin sticky-cart"));
    }

    #[test]
    fn invalid_id_rejected() {
        let err = apply_all("", &[injection("bad id!", InjectionKind::Liquid)]).unwrap_err();
        assert!(matches!(err, AppError::Sandbox(_)));
    }
}
