use crate::error::{CoreError, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every reference this service generates.
pub const REFERENCE_NAMESPACE: &str = "healthcheck";
const REFERENCE_SUFFIX_LEN: usize = 9;

/// Represents a positive amount in the gateway's currency (major units).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(CoreError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Converts to the gateway's smallest currency unit (cents/kobo).
    ///
    /// Fractions below one minor unit are rejected rather than rounded.
    pub fn to_minor_units(&self) -> Result<i64> {
        let too_large = || CoreError::ValidationError(format!("Amount {} is too large", self.0));
        let minor = self
            .0
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or_else(too_large)?;
        if minor.fract() != Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "Amount {} has more precision than the currency allows",
                self.0
            )));
        }
        minor.to_i64().ok_or_else(too_large)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CoreError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Pending,
        PaymentStatus::Paid,
        PaymentStatus::Failed,
        PaymentStatus::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }

    /// Transitions only ever move out of `Pending`, and only into a terminal state.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        *self == PaymentStatus::Pending && next.is_terminal()
    }

    /// Maps the gateway's status vocabulary onto ours.
    ///
    /// Anything unrecognised stays `Pending`, which `transition` treats as a no-op.
    pub fn from_gateway(status: &str) -> Self {
        match status {
            "success" => PaymentStatus::Paid,
            "failed" => PaymentStatus::Failed,
            "abandoned" => PaymentStatus::Cancelled,
            _ => PaymentStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier of one payment attempt, shared with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    /// `healthcheck_<user>_<unix millis>_<9 random alphanumerics>`.
    pub fn generate(user_id: &str) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REFERENCE_SUFFIX_LEN)
            .map(|c| char::from(c).to_ascii_lowercase())
            .collect();
        Self(format!(
            "{}_{}_{}_{}",
            REFERENCE_NAMESPACE,
            user_id,
            Utc::now().timestamp_millis(),
            suffix
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for PaymentReference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PaymentReference {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A locally tracked payment attempt.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentIntent {
    pub reference: PaymentReference,
    pub user_id: String,
    pub amount: Amount,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// User ids are embedded in references, which the gateway restricts to a
/// small alphabet and which end up in request paths.
pub fn validate_user_id(user_id: &str) -> Result<()> {
    if user_id.is_empty() {
        return Err(CoreError::ValidationError(
            "User id must not be empty".to_string(),
        ));
    }
    if !user_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(CoreError::ValidationError(format!(
            "User id {:?} may only contain ASCII letters, digits and '-'",
            user_id
        )));
    }
    Ok(())
}

impl PaymentIntent {
    /// A fresh `Pending` intent with a newly generated reference.
    pub fn pending(user_id: &str, amount: Amount) -> Result<Self> {
        validate_user_id(user_id)?;
        Ok(Self {
            reference: PaymentReference::generate(user_id),
            user_id: user_id.to_string(),
            amount,
            status: PaymentStatus::Pending,
            created_at: Utc::now(),
        })
    }
}

/// Count and summed amount of the intents in one status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusTotal {
    pub status: PaymentStatus,
    pub count: usize,
    pub amount: Decimal,
}

/// Aggregate over every stored intent, one entry per status in
/// `PaymentStatus::ALL` order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStats {
    pub by_status: Vec<StatusTotal>,
    pub paid_revenue: Decimal,
}

impl Default for PaymentStats {
    fn default() -> Self {
        Self {
            by_status: PaymentStatus::ALL
                .into_iter()
                .map(|status| StatusTotal {
                    status,
                    count: 0,
                    amount: Decimal::ZERO,
                })
                .collect(),
            paid_revenue: Decimal::ZERO,
        }
    }
}

impl PaymentStats {
    pub fn record(&mut self, intent: &PaymentIntent) {
        let amount = intent.amount.value();
        if let Some(total) = self
            .by_status
            .iter_mut()
            .find(|total| total.status == intent.status)
        {
            total.count += 1;
            total.amount = total.amount.saturating_add(amount);
        }
        if intent.status == PaymentStatus::Paid {
            self.paid_revenue = self.paid_revenue.saturating_add(amount);
        }
    }

    pub fn total(&self, status: PaymentStatus) -> Option<&StatusTotal> {
        self.by_status.iter().find(|total| total.status == status)
    }
}

impl<'a> FromIterator<&'a PaymentIntent> for PaymentStats {
    fn from_iter<I: IntoIterator<Item = &'a PaymentIntent>>(intents: I) -> Self {
        let mut stats = Self::default();
        for intent in intents {
            stats.record(intent);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(CoreError::ValidationError(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_amount_minor_units() {
        assert_eq!(Amount::new(dec!(500)).unwrap().to_minor_units().unwrap(), 50_000);
        assert_eq!(Amount::new(dec!(1.25)).unwrap().to_minor_units().unwrap(), 125);
        assert!(Amount::new(dec!(0.001)).unwrap().to_minor_units().is_err());
    }

    #[test]
    fn test_amount_minor_units_overflow_is_rejected() {
        let huge = Amount::new(Decimal::MAX).unwrap();
        assert!(matches!(
            huge.to_minor_units(),
            Err(CoreError::ValidationError(msg)) if msg.contains("too large")
        ));
        let beyond_i64 = Amount::new(dec!(100_000_000_000_000_000)).unwrap();
        assert!(beyond_i64.to_minor_units().is_err());
    }

    #[test]
    fn test_amount_deserialization_rejects_non_positive() {
        let ok: Amount = serde_json::from_str("\"12.50\"").unwrap();
        assert_eq!(ok.value(), dec!(12.50));
        assert!(serde_json::from_str::<Amount>("\"0\"").is_err());
    }

    #[test]
    fn test_status_transitions_are_monotonic() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Failed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Pending));
        for terminal in [Paid, Failed, Cancelled] {
            for next in [Pending, Paid, Failed, Cancelled] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_gateway_status_mapping() {
        assert_eq!(PaymentStatus::from_gateway("success"), PaymentStatus::Paid);
        assert_eq!(PaymentStatus::from_gateway("failed"), PaymentStatus::Failed);
        assert_eq!(
            PaymentStatus::from_gateway("abandoned"),
            PaymentStatus::Cancelled
        );
        assert_eq!(
            PaymentStatus::from_gateway("reversed"),
            PaymentStatus::Pending
        );
    }

    #[test]
    fn test_reference_shape_and_uniqueness() {
        let reference = PaymentReference::generate("user-1");
        let parts: Vec<&str> = reference.as_str().split('_').collect();
        assert_eq!(parts[0], REFERENCE_NAMESPACE);
        assert_eq!(parts[1], "user-1");
        assert!(parts[2].parse::<i64>().is_ok());
        assert_eq!(parts[3].len(), REFERENCE_SUFFIX_LEN);

        let many: HashSet<PaymentReference> =
            (0..1000).map(|_| PaymentReference::generate("u")).collect();
        assert_eq!(many.len(), 1000);
    }

    #[test]
    fn test_pending_intent_requires_user() {
        let amount = Amount::new(dec!(10)).unwrap();
        assert!(PaymentIntent::pending(" ", amount).is_err());
        assert!(PaymentIntent::pending("", amount).is_err());
        let intent = PaymentIntent::pending("u1", amount).unwrap();
        assert_eq!(intent.status, PaymentStatus::Pending);
    }

    #[test]
    fn test_user_id_outside_reference_alphabet_rejected() {
        let amount = Amount::new(dec!(10)).unwrap();
        for bad in ["x/../../customer?perPage=1&", "a_b", "user 1", "ü", "a.b"] {
            assert!(
                matches!(
                    PaymentIntent::pending(bad, amount),
                    Err(CoreError::ValidationError(_))
                ),
                "{bad:?} should be rejected"
            );
        }
        let uuid = "3f2b8c1e-9d4a-4e7b-8a51-0c6d2f9e7a13";
        let intent = PaymentIntent::pending(uuid, amount).unwrap();
        assert!(intent.reference.as_str().contains(uuid));
    }

    #[test]
    fn test_stats_group_by_status() {
        let mut paid = PaymentIntent::pending("u1", Amount::new(dec!(500)).unwrap()).unwrap();
        paid.status = PaymentStatus::Paid;
        let mut paid_too = PaymentIntent::pending("u2", Amount::new(dec!(250.50)).unwrap()).unwrap();
        paid_too.status = PaymentStatus::Paid;
        let pending = PaymentIntent::pending("u1", Amount::new(dec!(100)).unwrap()).unwrap();

        let stats: PaymentStats = [&paid, &paid_too, &pending].into_iter().collect();

        assert_eq!(stats.by_status.len(), 4);
        let paid_total = stats.total(PaymentStatus::Paid).unwrap();
        assert_eq!(paid_total.count, 2);
        assert_eq!(paid_total.amount, dec!(750.50));
        assert_eq!(stats.total(PaymentStatus::Pending).unwrap().count, 1);
        assert_eq!(stats.total(PaymentStatus::Failed).unwrap().count, 0);
        assert_eq!(stats.paid_revenue, dec!(750.50));
    }
}
