//! Location Provider: the device position sensor and the fire-and-forget
//! query protocol the engines use on top of it.
//!
//! Engines never block on a position. They call
//! [`LocationProvider::request`] and receive a [`LocationQuery`] ticket; the
//! result is delivered later to the owning engine's `on_location`, which
//! checks the ticket's [`QueryOrigin`] against its current session or journey
//! and drops anything stale.

mod sensor;

pub use sensor::{parse_position, ConfiguredSensor, FixedSensor, UnavailableSensor, POSITION_ENV};

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::alert::SessionId;
use crate::error::LocationError;
use crate::journey::JourneyId;

/// A WGS84 position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Link to this position on a maps service, e.g. `https://maps.google.com/?q=`.
    pub fn maps_link(&self, base: &str) -> String {
        format!("{base}{},{}", self.latitude, self.longitude)
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Who asked for a position. Results are only applied if the origin is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryOrigin {
    Alert { session: SessionId },
    Journey { journey: JourneyId },
}

/// Ticket for one in-flight position query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationQuery {
    pub id: u64,
    pub origin: QueryOrigin,
}

/// Single-shot position sensor (`getCurrentPosition`).
///
/// May block; the runtime calls it from tokio's blocking pool.
pub trait PositionSensor: Send + Sync {
    fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Asynchronous, fire-and-forget position queries.
pub trait LocationProvider {
    /// Issue a query and return its ticket immediately.
    fn request(&mut self, origin: QueryOrigin) -> LocationQuery;
}

/// Provider that only queues tickets; the caller resolves them explicitly.
///
/// Used by tests and by callers that want to control resolution order.
#[derive(Debug, Default)]
pub struct PendingLocations {
    next_id: u64,
    queue: VecDeque<LocationQuery>,
}

impl PendingLocations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest unresolved query.
    pub fn pop(&mut self) -> Option<LocationQuery> {
        self.queue.pop_front()
    }

    /// Newest unresolved query.
    pub fn pop_latest(&mut self) -> Option<LocationQuery> {
        self.queue.pop_back()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl LocationProvider for PendingLocations {
    fn request(&mut self, origin: QueryOrigin) -> LocationQuery {
        self.next_id += 1;
        let query = LocationQuery {
            id: self.next_id,
            origin,
        };
        self.queue.push_back(query);
        query
    }
}
