use crate::domain::facility::{ADDRESS_PLACEHOLDER, DEFAULT_FACILITY_NAME, FacilityCandidate};
use crate::domain::geo::Coordinate;
use crate::domain::ports::FacilitySource;
use crate::error::{CoreError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::io::Read;
use std::path::PathBuf;

const SOURCE_NAME: &str = "local";

/// One row of the curated facility table.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct FacilityRow {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub phone: Option<String>,
}

impl From<FacilityRow> for FacilityCandidate {
    fn from(row: FacilityRow) -> Self {
        let or_default = |value: String, default: &str| {
            if value.trim().is_empty() {
                default.to_string()
            } else {
                value
            }
        };
        FacilityCandidate {
            id: format!("{}_{}", SOURCE_NAME, row.id),
            name: or_default(row.name, DEFAULT_FACILITY_NAME),
            address: or_default(row.address, ADDRESS_PLACEHOLDER),
            coordinate: Coordinate {
                latitude: row.latitude,
                longitude: row.longitude,
            },
            phone: row.phone.filter(|p| !p.trim().is_empty()),
        }
    }
}

/// Reads facility rows from a CSV source with an
/// `id,name,address,latitude,longitude,phone` header.
pub struct FacilityReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> FacilityReader<R> {
    /// Creates a new `FacilityReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes rows.
    pub fn rows(self) -> impl Iterator<Item = std::result::Result<FacilityRow, csv::Error>> {
        self.reader.into_deserialize()
    }

    /// Reads the whole table; any malformed row fails the read.
    pub fn read_all(self) -> Result<Vec<FacilityCandidate>> {
        self.rows()
            .map(|row| {
                row.map(FacilityCandidate::from)
                    .map_err(|e| CoreError::source_unavailable(SOURCE_NAME, e))
            })
            .collect()
    }
}

/// The secondary facility source: a full-table read of a CSV file, with no
/// radius filtering of its own.
#[derive(Debug, Clone)]
pub struct CsvFacilityTable {
    path: PathBuf,
}

impl CsvFacilityTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FacilitySource for CsvFacilityTable {
    fn name(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch(&self, _center: Coordinate, _radius_km: f64) -> Result<Vec<FacilityCandidate>> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let file = std::fs::File::open(&path).map_err(|e| {
                CoreError::source_unavailable(SOURCE_NAME, format!("{}: {}", path.display(), e))
            })?;
            FacilityReader::new(file).read_all()
        })
        .await
        .map_err(|e| CoreError::source_unavailable(SOURCE_NAME, e))?
    }
}
