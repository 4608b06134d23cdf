use crate::domain::payment::{PaymentReference, PaymentStatus};
use crate::domain::ports::{
    PaymentIntentStore, PaymentIntentStoreRef, TransactionVerifier, TransactionVerifierBox,
};
use crate::domain::webhook::WebhookEvent;
use crate::error::{CoreError, Result};
use serde::Serialize;
use tracing::{info, warn};

/// What a reconciliation attempt did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub applied: bool,
    pub resulting_status: Option<PaymentStatus>,
    pub reference: Option<String>,
}

impl ReconcileOutcome {
    fn ignored() -> Self {
        Self {
            applied: false,
            resulting_status: None,
            reference: None,
        }
    }
}

/// Applies externally reported payment outcomes to the intent store.
///
/// Both channels, the signed webhook and the client's success signal, end up
/// in the same mapping and `transition` call, so whichever arrives first wins
/// and later signals are no-ops.
pub struct PaymentReconciler {
    store: PaymentIntentStoreRef,
    verifier: Option<TransactionVerifierBox>,
}

impl PaymentReconciler {
    pub fn new(store: PaymentIntentStoreRef) -> Self {
        Self {
            store,
            verifier: None,
        }
    }

    /// Enables the client success path by confirming each signal with the gateway.
    pub fn with_verifier(mut self, verifier: TransactionVerifierBox) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Reconciles a verified webhook. Events other than a successful charge
    /// are acknowledged without touching the store.
    pub async fn reconcile(&self, event: WebhookEvent) -> Result<ReconcileOutcome> {
        if !event.is_charge_success() {
            info!(event = event.event_type(), "Ignoring webhook event");
            return Ok(ReconcileOutcome::ignored());
        }

        let reference = event
            .reference()
            .ok_or_else(|| CoreError::ValidationError("Missing payment reference".to_string()))?;

        self.apply(
            &PaymentReference::from(reference),
            event.external_status(),
            event.amount(),
            "webhook",
        )
        .await
    }

    /// Handles the client widget's success callback.
    ///
    /// The client's claim is never trusted directly: the gateway is asked for
    /// the transaction's status and that answer is reconciled. Without a
    /// verifier the signal is acknowledged and the webhook stays authoritative.
    pub async fn confirm_client_success(
        &self,
        reference: &PaymentReference,
    ) -> Result<ReconcileOutcome> {
        let current = self
            .store
            .get_by_reference(reference)
            .await?
            .ok_or_else(|| CoreError::NotFound(reference.to_string()))?;

        let Some(verifier) = &self.verifier else {
            info!(reference = %reference, "No gateway verifier configured, awaiting webhook");
            return Ok(ReconcileOutcome {
                applied: false,
                resulting_status: Some(current.status),
                reference: Some(reference.to_string()),
            });
        };

        let confirmation = verifier.confirm(reference).await?;
        if confirmation.reference != reference.as_str() {
            return Err(CoreError::Gateway(format!(
                "Gateway confirmed {} while {} was requested",
                confirmation.reference, reference
            )));
        }

        self.apply(
            reference,
            &confirmation.external_status,
            confirmation.amount,
            "client",
        )
        .await
    }

    async fn apply(
        &self,
        reference: &PaymentReference,
        external_status: &str,
        reported_amount: Option<i64>,
        channel: &'static str,
    ) -> Result<ReconcileOutcome> {
        let target = PaymentStatus::from_gateway(external_status);

        let intent = self
            .store
            .get_by_reference(reference)
            .await?
            .ok_or_else(|| CoreError::NotFound(reference.to_string()))?;
        if let (Some(reported), Ok(expected)) = (reported_amount, intent.amount.to_minor_units())
            && reported != expected
        {
            warn!(reference = %reference, reported, expected, "Gateway amount differs from intent");
        }

        let applied = self.store.transition(reference, target).await?;
        let resulting = self
            .store
            .get_by_reference(reference)
            .await?
            .map(|intent| intent.status)
            .ok_or_else(|| CoreError::NotFound(reference.to_string()))?;

        if applied {
            info!(reference = %reference, status = %resulting, channel, "Payment status updated");
        } else {
            info!(
                reference = %reference,
                requested = %target,
                current = %resulting,
                channel,
                "Transition not applied"
            );
        }

        Ok(ReconcileOutcome {
            applied,
            resulting_status: Some(resulting),
            reference: Some(reference.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::Amount;
    use crate::domain::ports::GatewayConfirmation;
    use crate::domain::webhook::{RawWebhook, WebhookSecret, sign};
    use crate::infrastructure::in_memory::InMemoryPaymentIntentStore;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const SECRET: &[u8] = b"whsec";

    fn event(event_type: &str, reference: &str, status: &str) -> WebhookEvent {
        let body = serde_json::json!({
            "event": event_type,
            "data": { "reference": reference, "amount": 50000, "status": status }
        })
        .to_string();
        let signature = sign(body.as_bytes(), SECRET).unwrap();
        RawWebhook::new(body, Some(signature))
            .verify(Some(&WebhookSecret::new(SECRET)))
            .unwrap()
            .parse()
            .unwrap()
    }

    async fn setup() -> (Arc<InMemoryPaymentIntentStore>, PaymentReference) {
        let store = Arc::new(InMemoryPaymentIntentStore::new());
        let intent = store
            .create("u1", Amount::new(dec!(500)).unwrap())
            .await
            .unwrap();
        (store, intent.reference)
    }

    struct FixedVerifier(&'static str);

    #[async_trait]
    impl TransactionVerifier for FixedVerifier {
        async fn confirm(&self, reference: &PaymentReference) -> Result<GatewayConfirmation> {
            Ok(GatewayConfirmation {
                reference: reference.to_string(),
                external_status: self.0.to_string(),
                amount: Some(50000),
            })
        }
    }

    #[tokio::test]
    async fn test_charge_success_marks_paid() {
        let (store, reference) = setup().await;
        let reconciler = PaymentReconciler::new(store.clone());

        let outcome = reconciler
            .reconcile(event("charge.success", reference.as_str(), "success"))
            .await
            .unwrap();

        assert!(outcome.applied);
        assert_eq!(outcome.resulting_status, Some(PaymentStatus::Paid));
    }

    #[tokio::test]
    async fn test_later_conflicting_signal_is_a_noop() {
        let (store, reference) = setup().await;
        let reconciler = PaymentReconciler::new(store.clone());

        reconciler
            .reconcile(event("charge.success", reference.as_str(), "success"))
            .await
            .unwrap();
        let second = reconciler
            .reconcile(event("charge.success", reference.as_str(), "failed"))
            .await
            .unwrap();

        assert!(!second.applied);
        assert_eq!(second.resulting_status, Some(PaymentStatus::Paid));
    }

    #[tokio::test]
    async fn test_unknown_event_is_acknowledged_without_transition() {
        let (store, reference) = setup().await;
        let reconciler = PaymentReconciler::new(store.clone());

        let outcome = reconciler
            .reconcile(event("transfer.success", reference.as_str(), "success"))
            .await
            .unwrap();

        assert_eq!(outcome, ReconcileOutcome::ignored());
        let intent = store.get_by_reference(&reference).await.unwrap().unwrap();
        assert_eq!(intent.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_unrecognised_status_stays_pending() {
        let (store, reference) = setup().await;
        let reconciler = PaymentReconciler::new(store);

        let outcome = reconciler
            .reconcile(event("charge.success", reference.as_str(), "ongoing"))
            .await
            .unwrap();
        assert!(!outcome.applied);
        assert_eq!(outcome.resulting_status, Some(PaymentStatus::Pending));
    }

    #[tokio::test]
    async fn test_unknown_reference_is_not_found() {
        let (store, _) = setup().await;
        let reconciler = PaymentReconciler::new(store);

        let result = reconciler
            .reconcile(event("charge.success", "healthcheck_nobody", "success"))
            .await;
        assert!(matches!(result, Err(CoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_client_success_without_verifier_waits_for_webhook() {
        let (store, reference) = setup().await;
        let reconciler = PaymentReconciler::new(store.clone());

        let outcome = reconciler.confirm_client_success(&reference).await.unwrap();
        assert!(!outcome.applied);
        assert_eq!(outcome.resulting_status, Some(PaymentStatus::Pending));
    }

    #[tokio::test]
    async fn test_client_success_uses_gateway_answer() {
        let (store, reference) = setup().await;
        let reconciler =
            PaymentReconciler::new(store.clone()).with_verifier(Box::new(FixedVerifier("abandoned")));

        let outcome = reconciler.confirm_client_success(&reference).await.unwrap();
        assert!(outcome.applied);
        assert_eq!(outcome.resulting_status, Some(PaymentStatus::Cancelled));

        // A webhook arriving afterwards cannot overwrite the first terminal state.
        let late = reconciler
            .reconcile(event("charge.success", reference.as_str(), "success"))
            .await
            .unwrap();
        assert!(!late.applied);
        assert_eq!(late.resulting_status, Some(PaymentStatus::Cancelled));
    }
}
