use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::location::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JourneyId(pub Uuid);

impl JourneyId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JourneyId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JourneyStatus {
    Active,
    Completed,
    Cancelled,
}

impl fmt::Display for JourneyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JourneyStatus::Active => "active",
            JourneyStatus::Completed => "completed",
            JourneyStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// One tracked trip. Only `status` and `last_known_location` change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journey {
    pub id: JourneyId,
    pub start_location: String,
    pub end_location: String,
    pub start_time: DateTime<Utc>,
    pub estimated_duration_minutes: u32,
    pub status: JourneyStatus,
    #[serde(default)]
    pub last_known_location: Option<Coordinates>,
}

impl Journey {
    pub(crate) fn start(start_location: String, end_location: String, minutes: u32) -> Self {
        Self {
            id: JourneyId::new(),
            start_location,
            end_location,
            start_time: Utc::now(),
            estimated_duration_minutes: minutes,
            status: JourneyStatus::Active,
            last_known_location: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == JourneyStatus::Active
    }

    pub fn expected_arrival(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(i64::from(self.estimated_duration_minutes))
    }
}
