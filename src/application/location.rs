use crate::domain::geo::Coordinate;
use crate::domain::location::{LocationError, LocationRequest, PositionFix};
use crate::domain::ports::{PositionSource, PositionSourceBox};
use tokio::sync::Mutex;
use tracing::debug;

/// Acquires the caller's coordinates, reusing a recent fix when allowed.
pub struct LocationProvider {
    source: PositionSourceBox,
    last_fix: Mutex<Option<PositionFix>>,
}

impl LocationProvider {
    pub fn new(source: PositionSourceBox) -> Self {
        Self {
            source,
            last_fix: Mutex::new(None),
        }
    }

    /// Returns a cached fix no older than `request.max_cache_age`, otherwise
    /// queries the platform, giving up with `Timeout` after `request.timeout`.
    pub async fn acquire(
        &self,
        request: LocationRequest,
    ) -> std::result::Result<Coordinate, LocationError> {
        if let Some(fix) = *self.last_fix.lock().await
            && fix.is_fresh(request.max_cache_age)
        {
            debug!("Using cached position fix");
            return Ok(fix.coordinate);
        }

        let fix = tokio::time::timeout(request.timeout, self.source.current_position())
            .await
            .map_err(|_| LocationError::Timeout)??;

        if !fix.coordinate.is_valid() {
            return Err(LocationError::Unavailable);
        }

        *self.last_fix.lock().await = Some(fix);
        Ok(fix.coordinate)
    }
}
