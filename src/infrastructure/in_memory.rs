use crate::domain::facility::FacilityCandidate;
use crate::domain::geo::Coordinate;
use crate::domain::payment::{PaymentIntent, PaymentReference, PaymentStats, PaymentStatus};
use crate::domain::ports::{FacilitySource, PaymentIntentStore};
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for payment intents.
///
/// Uses `Arc<RwLock<HashMap<PaymentReference, PaymentIntent>>>`; `transition`
/// performs its status check and update under one write guard.
#[derive(Default, Clone)]
pub struct InMemoryPaymentIntentStore {
    intents: Arc<RwLock<HashMap<PaymentReference, PaymentIntent>>>,
}

impl InMemoryPaymentIntentStore {
    /// Creates a new, empty in-memory intent store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentIntentStore for InMemoryPaymentIntentStore {
    async fn insert(&self, intent: PaymentIntent) -> Result<()> {
        let mut intents = self.intents.write().await;
        match intents.entry(intent.reference.clone()) {
            Entry::Occupied(_) => Err(CoreError::PersistenceError(format!(
                "Duplicate payment reference {}",
                intent.reference
            ))),
            Entry::Vacant(slot) => {
                slot.insert(intent);
                Ok(())
            }
        }
    }

    async fn get_by_reference(
        &self,
        reference: &PaymentReference,
    ) -> Result<Option<PaymentIntent>> {
        let intents = self.intents.read().await;
        Ok(intents.get(reference).cloned())
    }

    async fn transition(
        &self,
        reference: &PaymentReference,
        new_status: PaymentStatus,
    ) -> Result<bool> {
        let mut intents = self.intents.write().await;
        let intent = intents
            .get_mut(reference)
            .ok_or_else(|| CoreError::NotFound(reference.to_string()))?;
        if !intent.status.can_transition_to(new_status) {
            return Ok(false);
        }
        intent.status = new_status;
        Ok(true)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<PaymentIntent>> {
        let intents = self.intents.read().await;
        let mut owned: Vec<PaymentIntent> = intents
            .values()
            .filter(|intent| intent.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn payment_stats(&self) -> Result<PaymentStats> {
        let intents = self.intents.read().await;
        Ok(intents.values().collect())
    }
}

/// A fixed facility list served without any radius filtering.
#[derive(Default, Clone)]
pub struct InMemoryFacilityTable {
    rows: Arc<Vec<FacilityCandidate>>,
}

impl InMemoryFacilityTable {
    pub fn new(rows: Vec<FacilityCandidate>) -> Self {
        Self {
            rows: Arc::new(rows),
        }
    }
}

#[async_trait]
impl FacilitySource for InMemoryFacilityTable {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn fetch(&self, _center: Coordinate, _radius_km: f64) -> Result<Vec<FacilityCandidate>> {
        Ok(self.rows.as_ref().clone())
    }
}
