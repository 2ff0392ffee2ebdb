//! Notification Dispatcher: device-level outbound actions.
//!
//! Both actions are fire-and-forget. Opening a dialer or a share link gives
//! no delivery confirmation, so dispatch methods return nothing; outcomes are
//! only visible in the [`DispatchLog`].

mod log;
mod payload;

pub use log::{DispatchAction, DispatchLog, DispatchRecord, ExecutionStatus};
pub use payload::{NotificationPayload, PayloadKind};

use crate::storage::ShareConfig;

pub trait NotificationDispatcher {
    /// Open the telephony dialer for `number`.
    fn call(&mut self, number: &str);

    /// Open a pre-filled message share link for `payload`.
    fn share_via_message(&mut self, payload: &NotificationPayload);
}

/// Opens `tel:` and share links with the system URL handler.
pub struct SystemDispatcher {
    share: ShareConfig,
    /// Whether to actually open anything (false for dry-run)
    dry_run: bool,
    log: DispatchLog,
}

impl SystemDispatcher {
    pub fn new(share: ShareConfig) -> Self {
        Self {
            share,
            dry_run: false,
            log: DispatchLog::default(),
        }
    }

    /// Create a dry-run dispatcher (records, never opens)
    pub fn dry_run(share: ShareConfig) -> Self {
        Self {
            dry_run: true,
            ..Self::new(share)
        }
    }

    pub fn log(&self) -> &DispatchLog {
        &self.log
    }

    pub fn take_log(&mut self) -> DispatchLog {
        std::mem::take(&mut self.log)
    }

    fn open(&mut self, action: DispatchAction, target: String) {
        let status = if self.dry_run {
            ExecutionStatus::Skipped {
                reason: "dry-run mode".to_string(),
            }
        } else {
            match open::that_detached(&target) {
                Ok(()) => ExecutionStatus::Success,
                Err(e) => {
                    tracing::warn!(?action, %target, error = %e, "dispatch failed");
                    ExecutionStatus::Failed {
                        reason: e.to_string(),
                    }
                }
            }
        };
        tracing::debug!(?action, %target, ?status, "dispatched");
        self.log.push(action, target, status);
    }
}

impl NotificationDispatcher for SystemDispatcher {
    fn call(&mut self, number: &str) {
        let number: String = number.chars().filter(|c| !c.is_whitespace()).collect();
        if number.is_empty() {
            tracing::warn!("refusing to dial an empty number");
            self.log.push(
                DispatchAction::Call,
                "tel:".to_string(),
                ExecutionStatus::Failed {
                    reason: "empty phone number".to_string(),
                },
            );
            return;
        }
        self.open(DispatchAction::Call, format!("tel:{number}"));
    }

    fn share_via_message(&mut self, payload: &NotificationPayload) {
        let link = payload.share_link(&self.share);
        self.open(DispatchAction::Share, link);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Coordinates;

    #[test]
    fn dry_run_records_skipped_call() {
        let mut dispatcher = SystemDispatcher::dry_run(ShareConfig::default());
        dispatcher.call("100");

        let record = dispatcher.log().last().unwrap();
        assert_eq!(record.action, DispatchAction::Call);
        assert_eq!(record.target, "tel:100");
        assert!(matches!(record.status, ExecutionStatus::Skipped { .. }));
    }

    #[test]
    fn call_strips_whitespace_from_number() {
        let mut dispatcher = SystemDispatcher::dry_run(ShareConfig::default());
        dispatcher.call("+91 98765 43210");
        assert_eq!(dispatcher.log().last().unwrap().target, "tel:+919876543210");
    }

    #[test]
    fn empty_number_is_recorded_as_failure() {
        let mut dispatcher = SystemDispatcher::dry_run(ShareConfig::default());
        dispatcher.call("  ");
        assert_eq!(dispatcher.log().failure_count(), 1);
    }

    #[test]
    fn share_uses_configured_message_url() {
        let share = ShareConfig {
            message_url: "sms:?body=".to_string(),
            ..ShareConfig::default()
        };
        let mut dispatcher = SystemDispatcher::dry_run(share);
        dispatcher.share_via_message(&NotificationPayload::share(Coordinates::new(1.0, 2.0)));

        let record = dispatcher.take_log().records.remove(0);
        assert_eq!(record.action, DispatchAction::Share);
        assert!(record.target.starts_with("sms:?body=I%27m%20currently%20at"));
        assert!(dispatcher.log().records.is_empty());
    }
}
