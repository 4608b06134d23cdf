//! Inbound gateway notifications.
//!
//! A [`RawWebhook`] holds the body exactly as received. The only way to reach
//! a parsed [`WebhookEvent`] is `RawWebhook::verify` followed by
//! `VerifiedWebhook::parse`, so nothing downstream ever sees unsigned data.

use crate::error::{CoreError, Result};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha512;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha512 = Hmac<Sha512>;

/// The single event type that drives status changes.
pub const CHARGE_SUCCESS_EVENT: &str = "charge.success";

/// Shared secret used to authenticate gateway callbacks.
#[derive(Clone)]
pub struct WebhookSecret(Vec<u8>);

impl WebhookSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WebhookSecret(***)")
    }
}

/// Hex-encoded HMAC-SHA512 of `body` under `secret`.
pub fn sign(body: &[u8], secret: &[u8]) -> Result<String> {
    let mut mac = HmacSha512::new_from_slice(secret)
        .map_err(|e| CoreError::Configuration(format!("Unusable webhook secret: {}", e)))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `signature_header` against the HMAC-SHA512 of the exact raw body.
///
/// An empty secret, an empty header or a header that is not valid hex never
/// verifies.
pub fn verify(raw_body: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    if secret.is_empty() {
        return false;
    }
    let provided = match hex::decode(signature_header.trim()) {
        Ok(bytes) if !bytes.is_empty() => bytes,
        _ => return false,
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret) else {
        return false;
    };
    mac.update(raw_body);
    let expected = mac.finalize().into_bytes();

    expected.as_slice().ct_eq(provided.as_slice()).into()
}

/// A webhook request as it arrived on the wire, not yet trusted.
#[derive(Debug, Clone)]
pub struct RawWebhook {
    body: Vec<u8>,
    signature: Option<String>,
}

impl RawWebhook {
    pub fn new(body: impl Into<Vec<u8>>, signature: Option<String>) -> Self {
        Self {
            body: body.into(),
            signature,
        }
    }

    /// Authenticates the body. Missing header or missing secret is a failure.
    pub fn verify(self, secret: Option<&WebhookSecret>) -> Result<VerifiedWebhook> {
        let (Some(signature), Some(secret)) = (self.signature.as_deref(), secret) else {
            return Err(CoreError::SignatureInvalid);
        };
        if verify(&self.body, signature, secret.as_bytes()) {
            Ok(VerifiedWebhook {
                body: self.body,
                signature: self.signature.unwrap_or_default(),
            })
        } else {
            Err(CoreError::SignatureInvalid)
        }
    }
}

/// A body whose signature has been checked. Only obtainable via [`RawWebhook::verify`].
#[derive(Debug, Clone)]
pub struct VerifiedWebhook {
    body: Vec<u8>,
    signature: String,
}

#[derive(Deserialize)]
struct EnvelopeWire {
    event: String,
    #[serde(default)]
    data: ChargeWire,
}

#[derive(Deserialize, Default)]
struct ChargeWire {
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    status: Option<String>,
}

impl VerifiedWebhook {
    pub fn parse(self) -> Result<WebhookEvent> {
        let envelope: EnvelopeWire = serde_json::from_slice(&self.body)
            .map_err(|e| CoreError::ValidationError(format!("Malformed webhook payload: {}", e)))?;

        Ok(WebhookEvent {
            raw_body: self.body,
            signature_header: self.signature,
            event_type: envelope.event,
            reference: envelope.data.reference.filter(|r| !r.is_empty()),
            external_status: envelope.data.status.unwrap_or_default(),
            amount: envelope.data.amount,
        })
    }
}

/// A verified, parsed gateway notification. Consumed by reconciliation, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEvent {
    raw_body: Vec<u8>,
    signature_header: String,
    event_type: String,
    reference: Option<String>,
    external_status: String,
    amount: Option<i64>,
}

impl WebhookEvent {
    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    pub fn signature_header(&self) -> &str {
        &self.signature_header
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    pub fn external_status(&self) -> &str {
        &self.external_status
    }

    /// Amount in the currency's minor unit, as reported by the gateway.
    pub fn amount(&self) -> Option<i64> {
        self.amount
    }

    pub fn is_charge_success(&self) -> bool {
        self.event_type == CHARGE_SUCCESS_EVENT
    }
}
