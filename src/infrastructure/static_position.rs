use crate::domain::geo::Coordinate;
use crate::domain::location::{LocationError, PositionFix};
use crate::domain::ports::PositionSource;
use async_trait::async_trait;

/// A position source that always reports the coordinate it was built with,
/// e.g. one supplied on the command line. No coordinate means the platform
/// has no fix.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPositionSource {
    coordinate: Option<Coordinate>,
}

impl StaticPositionSource {
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl PositionSource for StaticPositionSource {
    async fn current_position(&self) -> Result<PositionFix, LocationError> {
        self.coordinate
            .map(PositionFix::now)
            .ok_or(LocationError::Unavailable)
    }
}
