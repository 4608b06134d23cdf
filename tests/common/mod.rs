#![allow(dead_code)]

use async_trait::async_trait;
use healthcheck::application::checkout::CheckoutService;
use healthcheck::application::discovery::ClinicDiscovery;
use healthcheck::application::reconciler::PaymentReconciler;
use healthcheck::domain::facility::FacilityCandidate;
use healthcheck::domain::geo::Coordinate;
use healthcheck::domain::ports::{FacilitySource, PaymentIntentStoreRef};
use healthcheck::domain::webhook::{WebhookSecret, sign};
use healthcheck::error::{CoreError, Result};
use healthcheck::interfaces::http::AppState;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const TEST_SECRET: &str = "sk_test_integration";
pub const NAIROBI: (f64, f64) = (-1.2921, 36.8219);

pub fn nairobi() -> Coordinate {
    Coordinate::new(NAIROBI.0, NAIROBI.1).unwrap()
}

pub fn candidate(id: &str, latitude: f64, longitude: f64) -> FacilityCandidate {
    FacilityCandidate {
        id: id.to_string(),
        name: format!("Clinic {}", id),
        address: "Somewhere".to_string(),
        coordinate: Coordinate {
            latitude,
            longitude,
        },
        phone: None,
    }
}

#[derive(Clone)]
pub enum Script {
    Rows(Vec<FacilityCandidate>),
    Fail,
}

/// A facility source that answers from a fixed script and counts its calls.
pub struct ScriptedSource {
    name: &'static str,
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(name: &'static str, script: Script) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                name,
                script,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl FacilitySource for ScriptedSource {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, _center: Coordinate, _radius_km: f64) -> Result<Vec<FacilityCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Rows(rows) => Ok(rows.clone()),
            Script::Fail => Err(CoreError::source_unavailable(self.name, "scripted failure")),
        }
    }
}

pub fn discovery(primary: Script, secondary: Script) -> (ClinicDiscovery, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let (primary, primary_calls) = ScriptedSource::new("primary", primary);
    let (secondary, secondary_calls) = ScriptedSource::new("secondary", secondary);
    (
        ClinicDiscovery::new(Box::new(primary), Box::new(secondary)),
        primary_calls,
        secondary_calls,
    )
}

pub fn charge_body(reference: &str, status: &str, amount: i64) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "event": "charge.success",
        "data": { "reference": reference, "status": status, "amount": amount }
    }))
    .unwrap()
}

pub fn signature(body: &[u8]) -> String {
    sign(body, TEST_SECRET.as_bytes()).unwrap()
}

pub fn app_state(store: PaymentIntentStoreRef, secret: Option<&str>) -> AppState {
    let (discovery, _, _) = discovery(Script::Rows(vec![]), Script::Rows(vec![]));
    app_state_with(discovery, store, secret)
}

pub fn app_state_with(
    discovery: ClinicDiscovery,
    store: PaymentIntentStoreRef,
    secret: Option<&str>,
) -> AppState {
    AppState {
        discovery: Arc::new(discovery),
        checkout: Arc::new(CheckoutService::new(
            store.clone(),
            Some("pk_test_integration".to_string()),
        )),
        reconciler: Arc::new(PaymentReconciler::new(store.clone())),
        store,
        webhook_secret: secret.map(WebhookSecret::new),
    }
}
