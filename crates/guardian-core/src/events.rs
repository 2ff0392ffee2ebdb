use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::SessionId;
use crate::error::LocationError;
use crate::journey::{JourneyId, JourneyStatus};
use crate::location::Coordinates;

/// Every state change in the system produces an Event.
/// The presentation layer renders them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// SOS pressed, countdown running.
    AlertArmed {
        session: SessionId,
        countdown_secs: u32,
        at: DateTime<Utc>,
    },
    CountdownTicked {
        session: SessionId,
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    AlertCancelled {
        session: SessionId,
        at: DateTime<Utc>,
    },
    /// Countdown expired (or trigger was forced) and the actions were dispatched.
    AlertTriggered {
        session: SessionId,
        emergency_number: String,
        location: Option<Coordinates>,
        at: DateTime<Utc>,
    },
    /// A position result was applied to the alert session.
    LocationCaptured {
        session: SessionId,
        location: Coordinates,
        at: DateTime<Utc>,
    },
    /// A position query failed; nothing else changes.
    LocationUnavailable {
        error: LocationError,
        at: DateTime<Utc>,
    },
    /// A share could not happen yet; a fresh query was issued instead.
    LocationRequested {
        query_id: u64,
        at: DateTime<Utc>,
    },
    LocationShared {
        location: Coordinates,
        at: DateTime<Utc>,
    },
    CallPlaced {
        number: String,
        at: DateTime<Utc>,
    },
    JourneyStarted {
        journey: JourneyId,
        start_location: String,
        end_location: String,
        estimated_duration_minutes: u32,
        at: DateTime<Utc>,
    },
    /// Completed or cancelled.
    JourneyEnded {
        journey: JourneyId,
        status: JourneyStatus,
        at: DateTime<Utc>,
    },
    JourneyLocationUpdated {
        journey: JourneyId,
        location: Coordinates,
        at: DateTime<Utc>,
    },
    /// Tracking restarted for a journey loaded from the store.
    JourneyResumed {
        journey: JourneyId,
        at: DateTime<Utc>,
    },
}
