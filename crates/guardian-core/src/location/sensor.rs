//! Position sensor implementations.

use super::{Coordinates, PositionSensor};
use crate::error::LocationError;
use crate::storage::LocationConfig;

/// Environment override for the configured position, `"<lat>,<lng>"`.
pub const POSITION_ENV: &str = "GUARDIAN_POSITION";

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedSensor(pub Coordinates);

impl PositionSensor for FixedSensor {
    fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Always fails, like a device where location permission was refused.
#[derive(Debug, Clone)]
pub struct UnavailableSensor(pub LocationError);

impl Default for UnavailableSensor {
    fn default() -> Self {
        Self(LocationError::PermissionDenied)
    }
}

impl PositionSensor for UnavailableSensor {
    fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(self.0.clone())
    }
}

/// Desktop stand-in for a GPS: the position comes from `GUARDIAN_POSITION`
/// or the `[location]` section of the config.
#[derive(Debug, Clone)]
pub struct ConfiguredSensor {
    position: Option<Coordinates>,
}

impl ConfiguredSensor {
    pub fn new(position: Option<Coordinates>) -> Self {
        Self { position }
    }

    /// Environment wins over the config file.
    pub fn from_config(config: &LocationConfig) -> Self {
        let from_env = std::env::var(POSITION_ENV)
            .ok()
            .and_then(|raw| parse_position(&raw));
        Self {
            position: from_env.or_else(|| config.position()),
        }
    }
}

impl PositionSensor for ConfiguredSensor {
    fn current_position(&self) -> Result<Coordinates, LocationError> {
        self.position.ok_or_else(|| {
            LocationError::Unavailable(format!(
                "no position source configured (set {POSITION_ENV} or [location] in config)"
            ))
        })
    }
}

/// Parse `"lat,lng"`; `None` for anything malformed or out of range.
pub fn parse_position(raw: &str) -> Option<Coordinates> {
    let (lat, lng) = raw.split_once(',')?;
    let coords = Coordinates::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    coords.is_valid().then_some(coords)
}
