use std::fmt;

use serde::{Deserialize, Serialize};

use crate::location::Coordinates;

/// Identity of one alert session. Location results carry it so that a fix
/// requested by an earlier session can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    Idle,
    /// Countdown running; cancellable.
    Arming,
    /// Dispatching the alert actions. Only held while `trigger` runs.
    Active,
}

/// The one SOS episode the engine currently owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSession {
    pub id: SessionId,
    pub state: AlertState,
    /// Only meaningful while `Arming`.
    pub remaining_seconds: u32,
    pub captured_location: Option<Coordinates>,
    /// Query id of the fix behind `captured_location`.
    #[serde(skip)]
    pub(crate) fix_query: Option<u64>,
}

impl AlertSession {
    pub(crate) fn new(id: SessionId, state: AlertState, remaining_seconds: u32) -> Self {
        Self {
            id,
            state,
            remaining_seconds,
            captured_location: None,
            fix_query: None,
        }
    }
}

/// Read-only view for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSnapshot {
    pub session: SessionId,
    pub state: AlertState,
    pub remaining_seconds: u32,
    pub captured_location: Option<Coordinates>,
    pub emergency_number: String,
}
