use crate::domain::location::LocationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    LocationUnavailable(#[from] LocationError),
    #[error("Facility source '{source_name}' unavailable: {reason}")]
    SourceUnavailable {
        source_name: &'static str,
        reason: String,
    },
    #[error("Clinic discovery unavailable: no facility source could be queried")]
    DiscoveryUnavailable,
    #[error("Invalid coordinate: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    /// Carries no detail on purpose; callers must not learn why verification failed.
    #[error("Webhook signature verification failed")]
    SignatureInvalid,
    #[error("Payment reference not found: {0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Payment gateway error: {0}")]
    Gateway(String),
}

impl CoreError {
    pub fn source_unavailable(source_name: &'static str, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name,
            reason: reason.to_string(),
        }
    }

    pub fn missing_config(name: &str) -> Self {
        Self::Configuration(format!("{} is not configured", name))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for CoreError {
    fn from(e: rocksdb::Error) -> Self {
        Self::PersistenceError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
