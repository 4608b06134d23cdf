use crate::domain::payment::{Amount, PaymentIntent};
use crate::domain::ports::{PaymentIntentStore, PaymentIntentStoreRef};
use crate::error::{CoreError, Result};
use serde::Serialize;
use tracing::info;

pub const CHECKOUT_CURRENCY: &str = "KES";
pub const CHECKOUT_LABEL: &str = "HealthCheck Premium Advice";
pub const CHECKOUT_CHANNELS: [&str; 5] = ["card", "bank", "ussd", "qr", "mobile_money"];
pub const CHECKOUT_SERVICE: &str = "Premium Health Advice";

/// Extra field shown on the gateway's transaction record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomField {
    pub display_name: &'static str,
    pub variable_name: &'static str,
    pub value: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutMetadata {
    pub custom_fields: Vec<CustomField>,
}

impl Default for CheckoutMetadata {
    fn default() -> Self {
        Self {
            custom_fields: vec![CustomField {
                display_name: "Service",
                variable_name: "service",
                value: CHECKOUT_SERVICE,
            }],
        }
    }
}

/// Parameters the embedded gateway widget needs to start a charge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutSession {
    pub public_key: String,
    pub email: String,
    /// Amount in the currency's minor unit.
    pub amount: i64,
    pub reference: String,
    pub currency: &'static str,
    pub channels: Vec<&'static str>,
    pub label: &'static str,
    pub metadata: CheckoutMetadata,
}

/// Starts purchases: records the pending intent, then hands out the widget
/// configuration bound to its reference.
pub struct CheckoutService {
    store: PaymentIntentStoreRef,
    public_key: Option<String>,
}

impl CheckoutService {
    pub fn new(store: PaymentIntentStoreRef, public_key: Option<String>) -> Self {
        Self { store, public_key }
    }

    /// The intent is durably committed before any gateway parameters are
    /// returned; if the write fails the caller never reaches the gateway.
    pub async fn begin_checkout(
        &self,
        user_id: &str,
        email: &str,
        amount: Amount,
    ) -> Result<(PaymentIntent, CheckoutSession)> {
        let public_key = self
            .public_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| CoreError::missing_config("Payment gateway public key"))?;
        if email.trim().is_empty() {
            return Err(CoreError::ValidationError(
                "Email must not be empty".to_string(),
            ));
        }
        let minor_amount = amount.to_minor_units()?;

        let intent = self.store.create(user_id, amount).await?;
        info!(reference = %intent.reference, user_id, "Payment intent created");

        let session = CheckoutSession {
            public_key,
            email: email.to_string(),
            amount: minor_amount,
            reference: intent.reference.to_string(),
            currency: CHECKOUT_CURRENCY,
            channels: CHECKOUT_CHANNELS.to_vec(),
            label: CHECKOUT_LABEL,
            metadata: CheckoutMetadata::default(),
        };
        Ok((intent, session))
    }
}
