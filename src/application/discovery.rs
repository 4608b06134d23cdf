use crate::domain::facility::{Facility, FacilityCandidate};
use crate::domain::geo::{Coordinate, distance_km};
use crate::domain::ports::{FacilitySource, FacilitySourceBox};
use crate::error::{CoreError, Result};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Search radius for the primary (external) dataset.
pub const PRIMARY_RADIUS_KM: f64 = 10.0;
/// Search radius for the secondary (local) dataset.
pub const SECONDARY_RADIUS_KM: f64 = 50.0;
/// The primary tier returns at most this many facilities.
pub const PRIMARY_RESULT_CAP: usize = 20;

/// Finds and ranks facilities near a point, falling back from the primary
/// source to the secondary one.
///
/// Read-only and free of shared state: one instance can serve concurrent
/// requests.
pub struct ClinicDiscovery {
    primary: FacilitySourceBox,
    secondary: FacilitySourceBox,
}

impl ClinicDiscovery {
    pub fn new(primary: FacilitySourceBox, secondary: FacilitySourceBox) -> Self {
        Self { primary, secondary }
    }

    /// Facilities ordered by ascending distance from `center`.
    ///
    /// An empty list means both tiers answered without results; an error means
    /// neither could be queried.
    pub async fn find_nearby(&self, center: Coordinate) -> Result<Vec<Facility>> {
        if !center.is_valid() {
            return Err(CoreError::InvalidCoordinate {
                latitude: center.latitude,
                longitude: center.longitude,
            });
        }

        let primary_ok = match self.primary.fetch(center, PRIMARY_RADIUS_KM).await {
            Ok(candidates) => {
                let mut ranked = rank(center, candidates, PRIMARY_RADIUS_KM);
                if !ranked.is_empty() {
                    ranked.truncate(PRIMARY_RESULT_CAP);
                    info!(
                        source = self.primary.name(),
                        count = ranked.len(),
                        "Facilities found"
                    );
                    return Ok(ranked);
                }
                debug!(source = self.primary.name(), "No facilities within radius");
                true
            }
            Err(e) => {
                warn!(source = self.primary.name(), error = %e, "Falling back to secondary source");
                false
            }
        };

        match self.secondary.fetch(center, SECONDARY_RADIUS_KM).await {
            Ok(candidates) => {
                let ranked = rank(center, candidates, SECONDARY_RADIUS_KM);
                info!(
                    source = self.secondary.name(),
                    count = ranked.len(),
                    "Facilities found"
                );
                Ok(ranked)
            }
            Err(e) if primary_ok => {
                warn!(source = self.secondary.name(), error = %e, "Secondary source failed after empty primary");
                Ok(Vec::new())
            }
            Err(e) => {
                warn!(source = self.secondary.name(), error = %e, "All facility sources failed");
                Err(CoreError::DiscoveryUnavailable)
            }
        }
    }
}

/// Drops candidates beyond `radius_km` or with non-finite distance, removes
/// duplicate ids (first occurrence wins) and stable-sorts by distance.
fn rank(center: Coordinate, candidates: Vec<FacilityCandidate>, radius_km: f64) -> Vec<Facility> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<Facility> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let distance = distance_km(center, candidate.coordinate);
            if !distance.is_finite() || distance > radius_km {
                return None;
            }
            if !seen.insert(candidate.id.clone()) {
                return None;
            }
            Some(Facility::from_candidate(candidate, distance))
        })
        .collect();

    ranked.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    ranked
}
