use super::{ApiError, AppState};
use crate::application::checkout::CheckoutSession;
use crate::application::reconciler::ReconcileOutcome;
use crate::domain::facility::Facility;
use crate::domain::geo::Coordinate;
use crate::domain::payment::{Amount, PaymentIntent, PaymentReference, PaymentStats};
use crate::domain::ports::PaymentIntentStore;
use crate::error::CoreError;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ClinicQuery {
    pub lat: f64,
    pub lon: f64,
}

/// An empty list is a normal answer; only an exhausted search is an error.
pub async fn find_clinics(
    State(state): State<AppState>,
    Query(query): Query<ClinicQuery>,
) -> Result<Json<Vec<Facility>>, ApiError> {
    let center = Coordinate::new(query.lat, query.lon)?;
    let facilities = state.discovery.find_nearby(center).await?;
    Ok(Json(facilities))
}

#[derive(Debug, Deserialize)]
pub struct CreatePayment {
    pub user_id: String,
    pub email: String,
    pub amount: Amount,
}

#[derive(Debug, Serialize)]
pub struct CheckoutStarted {
    pub intent: PaymentIntent,
    pub checkout: CheckoutSession,
}

pub async fn create_payment(
    State(state): State<AppState>,
    Json(payload): Json<CreatePayment>,
) -> Result<(StatusCode, Json<CheckoutStarted>), ApiError> {
    let (intent, checkout) = state
        .checkout
        .begin_checkout(&payload.user_id, &payload.email, payload.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(CheckoutStarted { intent, checkout })))
}

pub async fn get_payment(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<PaymentIntent>, ApiError> {
    let reference = PaymentReference::from(reference);
    let intent = state
        .store
        .get_by_reference(&reference)
        .await?
        .ok_or_else(|| CoreError::NotFound(reference.to_string()))?;
    Ok(Json(intent))
}

pub async fn client_success(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<ReconcileOutcome>, ApiError> {
    let outcome = state
        .reconciler
        .confirm_client_success(&PaymentReference::from(reference))
        .await?;
    Ok(Json(outcome))
}

pub async fn payment_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PaymentIntent>>, ApiError> {
    Ok(Json(state.store.list_for_user(&user_id).await?))
}

pub async fn payment_stats(State(state): State<AppState>) -> Result<Json<PaymentStats>, ApiError> {
    Ok(Json(state.store.payment_stats().await?))
}
