use crate::domain::payment::PaymentReference;
use crate::domain::ports::{GatewayConfirmation, TransactionVerifier};
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.paystack.co";

/// Looks up transactions through the gateway's verify endpoint using the
/// secret key, giving the client success path an authenticated answer.
pub struct PaystackVerifier {
    api_url: Url,
    secret_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    reference: String,
    status: String,
    amount: Option<i64>,
}

impl PaystackVerifier {
    pub fn new(api_url: impl Into<String>, secret_key: String, timeout: Duration) -> Result<Self> {
        if secret_key.is_empty() {
            return Err(CoreError::missing_config("Payment gateway secret key"));
        }
        let api_url: String = api_url.into();
        let api_url = Url::parse(&api_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| {
                CoreError::Configuration(format!("Invalid gateway API URL: {}", api_url))
            })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_url,
            secret_key,
            client,
        })
    }

    /// The reference is pushed as one percent-encoded path segment, so it can
    /// never address another endpoint.
    fn url(&self, reference: &PaymentReference) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CoreError::Configuration(format!("Invalid gateway API URL: {}", self.api_url))
            })?
            .pop_if_empty()
            .extend(["transaction", "verify", reference.as_str()]);
        Ok(url)
    }
}

#[async_trait]
impl TransactionVerifier for PaystackVerifier {
    async fn confirm(&self, reference: &PaymentReference) -> Result<GatewayConfirmation> {
        let response = self
            .client
            .get(self.url(reference)?)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| CoreError::Gateway(format!("Verify request failed: {}", e)))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(CoreError::NotFound(reference.to_string()));
        }
        if !status.is_success() {
            return Err(CoreError::Gateway(format!(
                "Verify request returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| CoreError::Gateway(format!("Malformed verify response: {}", e)))?;

        match (body.status, body.data) {
            (true, Some(data)) => Ok(GatewayConfirmation {
                reference: data.reference,
                external_status: data.status,
                amount: data.amount,
            }),
            _ => Err(CoreError::Gateway(format!(
                "Gateway could not verify transaction: {}",
                body.message
            ))),
        }
    }
}
