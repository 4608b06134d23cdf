//! HTTP API consumed by the application's UI and by the payment gateway.
//!
//! # Endpoints
//!
//! - `GET /clinics?lat=&lon=` - Ranked nearby facilities
//! - `POST /payments` - Create a pending intent and its checkout session
//! - `GET /payments/{reference}` - Current state of one intent
//! - `POST /payments/{reference}/client-success` - Client widget success signal
//! - `GET /users/{user_id}/payments` - Payment history
//! - `GET /admin/payment-stats` - Per-status totals and paid revenue
//! - `ANY /webhooks/paystack` - Gateway webhook

pub mod handlers;
pub mod webhook;

use crate::application::checkout::CheckoutService;
use crate::application::discovery::ClinicDiscovery;
use crate::application::reconciler::PaymentReconciler;
use crate::domain::ports::PaymentIntentStoreRef;
use crate::domain::webhook::WebhookSecret;
use crate::error::CoreError;
use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Shared handler state. Every component is constructed at startup and
/// injected here; nothing is reached through globals.
#[derive(Clone)]
pub struct AppState {
    pub discovery: Arc<ClinicDiscovery>,
    pub checkout: Arc<CheckoutService>,
    pub reconciler: Arc<PaymentReconciler>,
    pub store: PaymentIntentStoreRef,
    pub webhook_secret: Option<WebhookSecret>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/clinics", get(handlers::find_clinics))
        .route("/payments", post(handlers::create_payment))
        .route("/payments/{reference}", get(handlers::get_payment))
        .route(
            "/payments/{reference}/client-success",
            post(handlers::client_success),
        )
        .route("/users/{user_id}/payments", get(handlers::payment_history))
        .route("/admin/payment-stats", get(handlers::payment_stats))
        .route("/webhooks/paystack", any(webhook::payment_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Maps core errors onto HTTP statuses with a `{error, success: false}` body.
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::InvalidCoordinate { .. } | CoreError::ValidationError(_) => {
                StatusCode::BAD_REQUEST
            }
            CoreError::LocationUnavailable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::SignatureInvalid => StatusCode::UNAUTHORIZED,
            CoreError::DiscoveryUnavailable | CoreError::SourceUnavailable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CoreError::Gateway(_) => StatusCode::BAD_GATEWAY,
            CoreError::PersistenceError(_) | CoreError::Configuration(_) => {
                error!(error = %self.0, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(json!({ "error": self.0.to_string(), "success": false })),
        )
            .into_response()
    }
}
