//! Dispatch logging.
//!
//! Dispatches are fire-and-forget, so the log is the only record of what
//! was attempted and how the platform responded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchAction {
    Call,
    Share,
}

/// Status of one dispatch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// The platform accepted the request (dialer or link opened)
    Success,
    /// The platform refused the request
    Failed {
        /// Human-readable reason for failure
        reason: String,
    },
    /// Nothing was opened
    Skipped {
        /// Human-readable reason for skip
        reason: String,
    },
}

/// One dispatched action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub action: DispatchAction,
    /// Phone number or deep link
    pub target: String,
    pub status: ExecutionStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchLog {
    pub records: Vec<DispatchRecord>,
}

impl DispatchLog {
    pub fn push(&mut self, action: DispatchAction, target: String, status: ExecutionStatus) {
        self.records.push(DispatchRecord {
            action,
            target,
            status,
            at: Utc::now(),
        });
    }

    /// Dispatches of the given kind, whatever their status.
    pub fn of(&self, action: DispatchAction) -> impl Iterator<Item = &DispatchRecord> {
        self.records.iter().filter(move |r| r.action == action)
    }

    pub fn calls(&self) -> usize {
        self.of(DispatchAction::Call).count()
    }

    pub fn shares(&self) -> usize {
        self.of(DispatchAction::Share).count()
    }

    pub fn success_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, ExecutionStatus::Success))
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, ExecutionStatus::Failed { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, ExecutionStatus::Skipped { .. }))
            .count()
    }

    pub fn last(&self) -> Option<&DispatchRecord> {
        self.records.last()
    }
}
