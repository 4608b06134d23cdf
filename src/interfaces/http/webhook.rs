use super::AppState;
use crate::application::reconciler::ReconcileOutcome;
use crate::domain::webhook::RawWebhook;
use crate::error::{CoreError, Result};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::{error, warn};

pub const SIGNATURE_HEADER: &str = "x-signature";
/// Header name the gateway itself uses; accepted as an alias.
pub const GATEWAY_SIGNATURE_HEADER: &str = "x-paystack-signature";

const CORS_HEADERS: [(HeaderName, &str); 3] = [
    (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        "authorization, x-client-info, apikey, content-type, x-signature, x-paystack-signature",
    ),
    (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
];

/// Gateway callback endpoint.
///
/// The body is taken as raw bytes and authenticated before it is parsed.
/// Non-charge events and already-settled intents still answer `200` so the
/// gateway stops retrying.
pub async fn payment_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method == Method::OPTIONS {
        return (StatusCode::OK, CORS_HEADERS, "ok").into_response();
    }
    if method != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, CORS_HEADERS, "Method not allowed").into_response();
    }

    let signature = headers
        .get(SIGNATURE_HEADER)
        .or_else(|| headers.get(GATEWAY_SIGNATURE_HEADER))
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if state.webhook_secret.is_none() {
        error!("Webhook secret is not configured; rejecting callback");
    }

    match process(&state, body, signature).await {
        Ok(outcome) => (
            StatusCode::OK,
            CORS_HEADERS,
            Json(json!({
                "success": true,
                "applied": outcome.applied,
                "status": outcome.resulting_status,
                "reference": outcome.reference,
            })),
        )
            .into_response(),
        Err(e) => {
            if matches!(e, CoreError::SignatureInvalid) {
                warn!("Rejected webhook with invalid or missing signature");
            } else {
                error!(error = %e, "Webhook processing failed");
            }
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                CORS_HEADERS,
                Json(json!({ "error": e.to_string(), "success": false })),
            )
                .into_response()
        }
    }
}

async fn process(
    state: &AppState,
    body: Bytes,
    signature: Option<String>,
) -> Result<ReconcileOutcome> {
    let event = RawWebhook::new(body.to_vec(), signature)
        .verify(state.webhook_secret.as_ref())?
        .parse()?;
    state.reconciler.reconcile(event).await
}
