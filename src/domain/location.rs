use super::geo::Coordinate;
use std::time::{Duration, Instant};
use thiserror::Error;

pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_millis(15_000);
pub const DEFAULT_MAX_CACHE_AGE: Duration = Duration::from_millis(300_000);

/// Why the caller's position could not be obtained.
///
/// Each variant maps to a distinct remedy shown to the user, so the
/// messages are surfaced verbatim.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location access denied. Please enable location services.")]
    PermissionDenied,
    #[error("Location information is unavailable.")]
    Unavailable,
    #[error("Location request timed out.")]
    Timeout,
}

/// A position reported by the platform together with when it was taken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub coordinate: Coordinate,
    pub captured_at: Instant,
}

impl PositionFix {
    pub fn now(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            captured_at: Instant::now(),
        }
    }

    pub fn is_fresh(&self, max_age: Duration) -> bool {
        self.captured_at.elapsed() <= max_age
    }
}

/// Limits applied to a single location acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationRequest {
    pub timeout: Duration,
    pub max_cache_age: Duration,
}

impl Default for LocationRequest {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_LOCATION_TIMEOUT,
            max_cache_age: DEFAULT_MAX_CACHE_AGE,
        }
    }
}

impl LocationRequest {
    pub fn from_millis(timeout_ms: u64, max_cache_age_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            max_cache_age: Duration::from_millis(max_cache_age_ms),
        }
    }
}
