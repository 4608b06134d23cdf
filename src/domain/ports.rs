use super::facility::FacilityCandidate;
use super::geo::Coordinate;
use super::location::{LocationError, PositionFix};
use super::payment::{Amount, PaymentIntent, PaymentReference, PaymentStats, PaymentStatus};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A dataset that can be asked for facilities around a point.
///
/// Results are unranked and may include entries outside `radius_km`.
/// Zero results is `Ok(vec![])`; only network or parse failures are errors.
#[async_trait]
pub trait FacilitySource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, center: Coordinate, radius_km: f64) -> Result<Vec<FacilityCandidate>>;
}

/// The platform's positioning service.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> std::result::Result<PositionFix, LocationError>;
}

/// Durable record of payment attempts, keyed by reference.
///
/// `transition` must be a single atomic compare-and-set against the backing
/// storage: accept only while the stored status is still `Pending`.
#[async_trait]
pub trait PaymentIntentStore: Send + Sync {
    /// Persists a new intent. Fails if the reference already exists.
    async fn insert(&self, intent: PaymentIntent) -> Result<()>;
    async fn get_by_reference(&self, reference: &PaymentReference)
    -> Result<Option<PaymentIntent>>;
    /// Returns `Ok(false)` when the intent is already terminal or `new_status` is `Pending`.
    async fn transition(
        &self,
        reference: &PaymentReference,
        new_status: PaymentStatus,
    ) -> Result<bool>;
    /// All intents of `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PaymentIntent>>;
    /// Per-status counts and amounts across all users.
    async fn payment_stats(&self) -> Result<PaymentStats>;

    /// Creates and durably records a `Pending` intent with a fresh reference.
    async fn create(&self, user_id: &str, amount: Amount) -> Result<PaymentIntent> {
        let intent = PaymentIntent::pending(user_id, amount)?;
        self.insert(intent.clone()).await?;
        Ok(intent)
    }
}

/// The gateway's authoritative status for a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfirmation {
    pub reference: String,
    pub external_status: String,
    pub amount: Option<i64>,
}

/// Server-side lookup of a transaction at the gateway.
#[async_trait]
pub trait TransactionVerifier: Send + Sync {
    async fn confirm(&self, reference: &PaymentReference) -> Result<GatewayConfirmation>;
}

pub type FacilitySourceBox = Box<dyn FacilitySource>;
pub type PositionSourceBox = Box<dyn PositionSource>;
pub type PaymentIntentStoreRef = Arc<dyn PaymentIntentStore>;
pub type TransactionVerifierBox = Box<dyn TransactionVerifier>;
