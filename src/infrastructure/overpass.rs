//! Primary facility source backed by an Overpass (OpenStreetMap) endpoint.
//!
//! The adapter asks for hospital and clinic nodes and ways around the
//! requested point and normalizes each element into a `FacilityCandidate`.
//! Ways carry no position of their own; `out center;` makes the service
//! attach a `center` object that is used instead.

use crate::domain::facility::{ADDRESS_PLACEHOLDER, DEFAULT_FACILITY_NAME, FacilityCandidate};
use crate::domain::geo::Coordinate;
use crate::domain::ports::FacilitySource;
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const SOURCE_NAME: &str = "overpass";
/// Client-side bound on one request, so discovery latency stays bounded.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Server-side evaluation limit embedded in the query.
const QUERY_TIMEOUT_SECS: u64 = 8;

#[derive(Debug, Clone)]
pub struct OverpassConfig {
    /// Interpreter endpoint, e.g. `https://overpass-api.de/api/interpreter`.
    pub api_url: String,
    pub timeout: Duration,
}

impl OverpassConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct OverpassFacilitySource {
    config: OverpassConfig,
    client: reqwest::Client,
}

impl OverpassFacilitySource {
    pub fn new(config: OverpassConfig) -> Result<Self> {
        if config.api_url.trim().is_empty() {
            return Err(CoreError::missing_config("Geodata service URL"));
        }
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CoreError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> CoreError {
        if e.is_timeout() {
            CoreError::source_unavailable(
                SOURCE_NAME,
                format!("request timed out after {:?}", self.config.timeout),
            )
        } else {
            CoreError::source_unavailable(SOURCE_NAME, e)
        }
    }
}

/// The Overpass QL query for medical facilities within `radius_km` of `center`.
pub fn build_query(center: Coordinate, radius_km: f64) -> String {
    let around = format!(
        "(around:{:.0},{},{})",
        radius_km * 1000.0,
        center.latitude,
        center.longitude
    );
    let clauses = [
        ("node", "amenity", "hospital"),
        ("node", "amenity", "clinic"),
        ("node", "healthcare", "hospital"),
        ("node", "healthcare", "clinic"),
        ("way", "amenity", "hospital"),
        ("way", "amenity", "clinic"),
    ];

    let mut query = format!("[out:json][timeout:{}];\n(\n", QUERY_TIMEOUT_SECS);
    for (kind, key, value) in clauses {
        query.push_str(&format!("  {kind}[\"{key}\"=\"{value}\"]{around};\n"));
    }
    query.push_str(");\nout center;\n");
    query
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    kind: String,
    id: u64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<LatLon>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.lon, &self.center) {
            (Some(latitude), Some(longitude), _) => Some(Coordinate {
                latitude,
                longitude,
            }),
            (_, _, Some(center)) => Some(Coordinate {
                latitude: center.lat,
                longitude: center.lon,
            }),
            _ => None,
        }
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn into_candidate(self) -> Option<FacilityCandidate> {
        let coordinate = self.coordinate()?;

        let name = self
            .tag("name")
            .or_else(|| self.tag("healthcare:speciality"))
            .unwrap_or(DEFAULT_FACILITY_NAME)
            .to_string();

        let address = match self.tag("addr:full") {
            Some(full) => full.to_string(),
            None => {
                let parts = format!(
                    "{} {}",
                    self.tag("addr:street").unwrap_or_default(),
                    self.tag("addr:city").unwrap_or_default()
                );
                let trimmed = parts.trim();
                if trimmed.is_empty() {
                    ADDRESS_PLACEHOLDER.to_string()
                } else {
                    trimmed.to_string()
                }
            }
        };

        let phone = self
            .tag("phone")
            .or_else(|| self.tag("contact:phone"))
            .map(str::to_string);

        Some(FacilityCandidate {
            id: format!("osm_{}_{}", self.kind, self.id),
            name,
            address,
            coordinate,
            phone,
        })
    }
}

#[async_trait]
impl FacilitySource for OverpassFacilitySource {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, center: Coordinate, radius_km: f64) -> Result<Vec<FacilityCandidate>> {
        let query = build_query(center, radius_km);

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Accept", "application/json")
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::source_unavailable(
                SOURCE_NAME,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let body: OverpassResponse = response.json().await.map_err(|e| {
            CoreError::source_unavailable(SOURCE_NAME, format!("malformed response: {}", e))
        })?;

        let total = body.elements.len();
        let candidates: Vec<FacilityCandidate> = body
            .elements
            .into_iter()
            .filter_map(OverpassElement::into_candidate)
            .collect();
        debug!(total, usable = candidates.len(), "Overpass elements normalized");

        Ok(candidates)
    }
}
