use super::geo::Coordinate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FACILITY_NAME: &str = "Medical Facility";
pub const ADDRESS_PLACEHOLDER: &str = "Address not available";

/// A facility as normalized by a source adapter, before ranking.
///
/// `id` is qualified by the source (`osm_node_42`, `local_7`) so ids never
/// collide across datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityCandidate {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinate: Coordinate,
    pub phone: Option<String>,
}

/// A ranked facility returned by discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub address: String,
    pub coordinate: Coordinate,
    pub phone: Option<String>,
    pub distance_km: f64,
}

impl Facility {
    pub fn from_candidate(candidate: FacilityCandidate, distance_km: f64) -> Self {
        Self {
            id: candidate.id,
            name: candidate.name,
            address: candidate.address,
            coordinate: candidate.coordinate,
            phone: candidate.phone,
            distance_km,
        }
    }
}
