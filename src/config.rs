use crate::application::checkout::CheckoutService;
use crate::application::discovery::ClinicDiscovery;
use crate::application::reconciler::PaymentReconciler;
use crate::domain::ports::{FacilitySourceBox, PaymentIntentStoreRef};
use crate::domain::webhook::WebhookSecret;
use crate::error::{CoreError, Result};
use crate::infrastructure::in_memory::{InMemoryFacilityTable, InMemoryPaymentIntentStore};
use crate::infrastructure::overpass::{OverpassConfig, OverpassFacilitySource};
use crate::infrastructure::paystack::{self, PaystackVerifier};
use crate::interfaces::csv::facility_reader::CsvFacilityTable;
use crate::interfaces::http::AppState;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Deployment settings. Secrets and endpoints come from the environment (or
/// flags) and are checked where they are used.
#[derive(Args, Clone)]
pub struct AppConfig {
    /// Overpass interpreter URL for the primary facility source
    #[arg(long, env = "OVERPASS_URL", global = true)]
    pub overpass_url: Option<String>,

    /// CSV file holding the curated facility table
    #[arg(long, env = "FACILITIES_CSV", global = true)]
    pub facilities_csv: Option<PathBuf>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "HEALTHCHECK_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Gateway secret key, used to sign webhooks and verify transactions
    #[arg(long, env = "PAYSTACK_SECRET_KEY", hide_env_values = true, global = true)]
    pub webhook_secret: Option<String>,

    /// Gateway public key handed to the checkout widget
    #[arg(long, env = "PAYSTACK_PUBLIC_KEY", global = true)]
    pub gateway_public_key: Option<String>,

    /// Gateway REST API base URL
    #[arg(long, env = "PAYSTACK_API_URL", default_value = paystack::DEFAULT_API_URL, global = true)]
    pub gateway_url: String,

    /// Client-side timeout for outbound HTTP calls, in seconds
    #[arg(long, default_value_t = DEFAULT_HTTP_TIMEOUT_SECS, global = true)]
    pub http_timeout_secs: u64,
}

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Matches the command-line defaults.
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            overpass_url: None,
            facilities_csv: None,
            db_path: None,
            webhook_secret: None,
            gateway_public_key: None,
            gateway_url: paystack::DEFAULT_API_URL.to_string(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn webhook_secret(&self) -> Option<WebhookSecret> {
        self.webhook_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
            .map(WebhookSecret::new)
    }

    pub fn build_discovery(&self) -> Result<ClinicDiscovery> {
        let url = self
            .overpass_url
            .as_deref()
            .ok_or_else(|| CoreError::missing_config("OVERPASS_URL"))?;
        let primary = OverpassFacilitySource::new(
            OverpassConfig::new(url).with_timeout(self.http_timeout()),
        )?;

        let secondary: FacilitySourceBox = match &self.facilities_csv {
            Some(path) => Box::new(CsvFacilityTable::new(path.clone())),
            None => {
                warn!("FACILITIES_CSV not set; fallback facility table is empty");
                Box::new(InMemoryFacilityTable::default())
            }
        };

        Ok(ClinicDiscovery::new(Box::new(primary), secondary))
    }

    pub fn open_store(&self) -> Result<PaymentIntentStoreRef> {
        match &self.db_path {
            #[cfg(feature = "storage-rocksdb")]
            Some(path) => {
                tracing::info!(path = %path.display(), "Using RocksDB payment store");
                let store = crate::infrastructure::rocksdb::RocksDBStore::open(path)?;
                Ok(Arc::new(store))
            }
            #[cfg(not(feature = "storage-rocksdb"))]
            Some(_) => {
                warn!(
                    "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
                );
                Ok(Arc::new(InMemoryPaymentIntentStore::new()))
            }
            None => Ok(Arc::new(InMemoryPaymentIntentStore::new())),
        }
    }

    pub fn build_reconciler(&self, store: PaymentIntentStoreRef) -> Result<PaymentReconciler> {
        let reconciler = PaymentReconciler::new(store);
        match self.webhook_secret.as_deref().filter(|s| !s.is_empty()) {
            Some(secret) => {
                let verifier =
                    PaystackVerifier::new(&self.gateway_url, secret.to_string(), self.http_timeout())?;
                Ok(reconciler.with_verifier(Box::new(verifier)))
            }
            None => {
                warn!("Gateway secret key not configured; client success signals will wait for the webhook");
                Ok(reconciler)
            }
        }
    }

    /// Wires every component for the HTTP surface.
    pub fn build_state(&self) -> Result<AppState> {
        let store = self.open_store()?;
        let discovery = self.build_discovery()?;
        let reconciler = self.build_reconciler(store.clone())?;
        let checkout = CheckoutService::new(store.clone(), self.gateway_public_key.clone());

        Ok(AppState {
            discovery: Arc::new(discovery),
            checkout: Arc::new(checkout),
            reconciler: Arc::new(reconciler),
            store,
            webhook_secret: self.webhook_secret(),
        })
    }
}
