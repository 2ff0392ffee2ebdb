//! Emergency alert engine.
//!
//! A countdown-gated SOS state machine. It owns no threads: the caller drives
//! the countdown by feeding timer fires back through [`AlertEngine::on_timer`]
//! (or calling [`AlertEngine::tick`] directly), and delivers position results
//! through [`AlertEngine::on_location`].
//!
//! ## State Transitions
//!
//! ```text
//! Idle --activate--> Arming --tick x N--> (Active) --> Idle
//!                    Arming --cancel----> Idle
//! ```
//!
//! `Active` is only held while the alert actions are dispatched. Every return
//! to `Idle` starts a fresh session, so results and ticks addressed to the old
//! one are dropped.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = AlertEngine::new(config.alert.clone());
//! engine.activate(&mut device);
//! // once per second while arming:
//! engine.tick(&mut device); // Returns Some(Event::AlertTriggered) at expiry
//! ```

use std::time::Duration;

use chrono::Utc;

use super::session::{AlertSession, AlertSnapshot, AlertState, SessionId};
use crate::error::LocationError;
use crate::events::Event;
use crate::location::{Coordinates, LocationQuery, QueryOrigin};
use crate::notify::NotificationPayload;
use crate::platform::Platform;
use crate::storage::AlertConfig;
use crate::timer::{TimerHandle, TimerKind};

const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

pub struct AlertEngine {
    config: AlertConfig,
    session: AlertSession,
    last_session: u64,
    /// Held only while arming.
    countdown: Option<TimerHandle>,
}

impl AlertEngine {
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            session: AlertSession::new(SessionId(1), AlertState::Idle, 0),
            last_session: 1,
            countdown: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> AlertState {
        self.session.state
    }

    pub fn session(&self) -> &AlertSession {
        &self.session
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.session.remaining_seconds
    }

    pub fn captured_location(&self) -> Option<Coordinates> {
        self.session.captured_location
    }

    pub fn countdown_timer(&self) -> Option<TimerHandle> {
        self.countdown
    }

    pub fn snapshot(&self) -> AlertSnapshot {
        AlertSnapshot {
            session: self.session.id,
            state: self.session.state,
            remaining_seconds: self.session.remaining_seconds,
            captured_location: self.session.captured_location,
            emergency_number: self.config.emergency_number.clone(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the countdown and fire a position query. Only valid from `Idle`.
    pub fn activate(&mut self, platform: &mut dyn Platform) -> Option<Event> {
        if self.session.state != AlertState::Idle {
            return None;
        }
        let countdown_secs = self.config.countdown_seconds.max(1);
        self.begin_session(AlertState::Arming, countdown_secs);
        self.countdown = Some(
            platform
                .timers()
                .start_repeating(TimerKind::Countdown, COUNTDOWN_PERIOD),
        );
        let query = self.query(platform);
        tracing::info!(session = %self.session.id, countdown_secs, query = query.id, "SOS armed");
        Some(Event::AlertArmed {
            session: self.session.id,
            countdown_secs,
            at: Utc::now(),
        })
    }

    /// One countdown second. Triggers when the countdown reaches zero.
    pub fn tick(&mut self, platform: &mut dyn Platform) -> Option<Event> {
        if self.session.state != AlertState::Arming {
            return None;
        }
        self.session.remaining_seconds = self.session.remaining_seconds.saturating_sub(1);
        tracing::debug!(session = %self.session.id, remaining = self.session.remaining_seconds, "countdown tick");
        if self.session.remaining_seconds == 0 {
            return self.trigger(platform);
        }
        Some(Event::CountdownTicked {
            session: self.session.id,
            remaining_secs: self.session.remaining_seconds,
            at: Utc::now(),
        })
    }

    /// Route a timer fire. Fires from any handle but the live countdown are ignored.
    pub fn on_timer(&mut self, handle: TimerHandle, platform: &mut dyn Platform) -> Option<Event> {
        if self.countdown != Some(handle) {
            tracing::debug!(?handle, "ignoring stale countdown tick");
            return None;
        }
        self.tick(platform)
    }

    /// Dispatch the alert now: share the captured location if there is one,
    /// dial the emergency number, return to `Idle`. Only valid while arming.
    pub fn trigger(&mut self, platform: &mut dyn Platform) -> Option<Event> {
        if self.session.state != AlertState::Arming {
            return None;
        }
        self.session.state = AlertState::Active;
        let session = self.session.id;
        let location = self.session.captured_location;

        let notifier = platform.notifier();
        if let Some(at) = location {
            notifier.share_via_message(&NotificationPayload::alert(at));
        }
        notifier.call(&self.config.emergency_number);

        self.release_countdown(platform);
        self.begin_session(AlertState::Idle, 0);
        tracing::info!(%session, has_location = location.is_some(), "SOS triggered");
        Some(Event::AlertTriggered {
            session,
            emergency_number: self.config.emergency_number.clone(),
            location,
            at: Utc::now(),
        })
    }

    /// Abort the countdown. Only valid while arming.
    pub fn cancel(&mut self, platform: &mut dyn Platform) -> Option<Event> {
        if self.session.state != AlertState::Arming {
            return None;
        }
        let session = self.session.id;
        self.release_countdown(platform);
        self.begin_session(AlertState::Idle, 0);
        tracing::info!(%session, "SOS cancelled");
        Some(Event::AlertCancelled {
            session,
            at: Utc::now(),
        })
    }

    /// Fire a position query for the current session. Valid in any state.
    pub fn request_location(&mut self, platform: &mut dyn Platform) -> Event {
        let query = self.query(platform);
        Event::LocationRequested {
            query_id: query.id,
            at: Utc::now(),
        }
    }

    /// Share the captured location. Without one, only a query is fired and
    /// nothing is shared.
    pub fn share_location(&mut self, platform: &mut dyn Platform) -> Event {
        match self.session.captured_location {
            Some(at) => {
                platform
                    .notifier()
                    .share_via_message(&NotificationPayload::share(at));
                Event::LocationShared {
                    location: at,
                    at: Utc::now(),
                }
            }
            None => {
                tracing::info!(session = %self.session.id, "no location yet, requesting one instead of sharing");
                self.request_location(platform)
            }
        }
    }

    /// Dial any number (emergency directory, a contact). Valid in any state.
    pub fn call(&mut self, number: &str, platform: &mut dyn Platform) -> Event {
        platform.notifier().call(number);
        Event::CallPlaced {
            number: number.to_string(),
            at: Utc::now(),
        }
    }

    /// Apply a position result. Results for another session, or older than the
    /// fix already held, are discarded. Failures never change state.
    pub fn on_location(
        &mut self,
        query: LocationQuery,
        result: Result<Coordinates, LocationError>,
    ) -> Option<Event> {
        let QueryOrigin::Alert { session } = query.origin else {
            return None;
        };
        if session != self.session.id {
            tracing::debug!(%session, current = %self.session.id, "discarding stale location result");
            return None;
        }
        match result {
            Ok(location) => {
                if self.session.fix_query.is_some_and(|held| held > query.id) {
                    tracing::debug!(query = query.id, "discarding out-of-order location result");
                    return None;
                }
                self.session.captured_location = Some(location);
                self.session.fix_query = Some(query.id);
                Some(Event::LocationCaptured {
                    session,
                    location,
                    at: Utc::now(),
                })
            }
            Err(error) => {
                tracing::warn!(%session, %error, "location unavailable");
                Some(Event::LocationUnavailable {
                    error,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Release any live timer. Cancels an arming session.
    pub fn shutdown(&mut self, platform: &mut dyn Platform) -> Option<Event> {
        let event = self.cancel(platform);
        self.release_countdown(platform);
        event
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn begin_session(&mut self, state: AlertState, remaining_seconds: u32) {
        self.last_session += 1;
        self.session = AlertSession::new(SessionId(self.last_session), state, remaining_seconds);
    }

    fn query(&mut self, platform: &mut dyn Platform) -> LocationQuery {
        platform.location().request(QueryOrigin::Alert {
            session: self.session.id,
        })
    }

    fn release_countdown(&mut self, platform: &mut dyn Platform) {
        if let Some(handle) = self.countdown.take() {
            platform.timers().cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{DispatchAction, PayloadKind};
    use crate::platform::ManualDevice;
    use crate::storage::ShareConfig;

    fn device() -> ManualDevice {
        ManualDevice::manual(ShareConfig::default())
    }

    fn engine() -> AlertEngine {
        AlertEngine::new(AlertConfig::default())
    }

    fn here() -> Coordinates {
        Coordinates::new(28.6139, 77.209)
    }

    #[test]
    fn activate_arms_countdown_and_requests_location() {
        let mut dev = device();
        let mut engine = engine();
        assert_eq!(engine.state(), AlertState::Idle);

        let event = engine.activate(&mut dev).unwrap();
        assert!(matches!(event, Event::AlertArmed { countdown_secs: 5, .. }));
        assert_eq!(engine.state(), AlertState::Arming);
        assert_eq!(engine.remaining_seconds(), 5);
        assert_eq!(dev.location.len(), 1);
        assert_eq!(dev.timers.live(TimerKind::Countdown), vec![engine.countdown_timer().unwrap()]);
    }

    #[test]
    fn activate_while_arming_is_ignored() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);
        let session = engine.session().id;

        assert!(engine.activate(&mut dev).is_none());
        assert_eq!(engine.session().id, session);
        assert_eq!(dev.timers.live_count(), 1);
    }

    #[test]
    fn five_ticks_dial_once_without_location() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);

        for remaining in (1..5).rev() {
            let event = engine.tick(&mut dev).unwrap();
            assert!(
                matches!(event, Event::CountdownTicked { remaining_secs, .. } if remaining_secs == remaining)
            );
        }
        let event = engine.tick(&mut dev).unwrap();
        assert!(matches!(event, Event::AlertTriggered { location: None, .. }));

        assert_eq!(engine.state(), AlertState::Idle);
        assert_eq!(engine.remaining_seconds(), 0);
        assert_eq!(dev.notifier.log().calls(), 1);
        assert_eq!(dev.notifier.log().shares(), 0);
        assert_eq!(dev.notifier.log().last().unwrap().target, "tel:100");
        assert_eq!(dev.timers.live_count(), 0);
    }

    #[test]
    fn trigger_shares_captured_location_before_dialling() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);
        let query = dev.location.pop().unwrap();
        assert!(engine.on_location(query, Ok(here())).is_some());

        for _ in 0..5 {
            engine.tick(&mut dev);
        }

        let records = &dev.notifier.log().records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].action, DispatchAction::Share);
        assert!(records[0].target.contains("Emergency%21%20I%20need%20help"));
        assert_eq!(records[1].action, DispatchAction::Call);
    }

    #[test]
    fn cancel_suppresses_late_tick() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);
        let handle = engine.countdown_timer().unwrap();
        engine.tick(&mut dev);

        assert!(matches!(engine.cancel(&mut dev), Some(Event::AlertCancelled { .. })));
        assert_eq!(engine.state(), AlertState::Idle);
        assert_eq!(dev.timers.cancelled(), &[handle]);

        // A fire already queued before the cancel lands afterwards.
        assert!(engine.on_timer(handle, &mut dev).is_none());
        assert!(engine.tick(&mut dev).is_none());
        assert!(dev.notifier.log().records.is_empty());
    }

    #[test]
    fn cancel_when_idle_is_ignored() {
        let mut dev = device();
        let mut engine = engine();
        assert!(engine.cancel(&mut dev).is_none());
        assert!(dev.timers.cancelled().is_empty());
    }

    #[test]
    fn location_resolving_after_cancel_is_discarded() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);
        engine.cancel(&mut dev);

        let query = dev.location.pop().unwrap();
        assert!(engine.on_location(query, Ok(here())).is_none());
        assert!(engine.captured_location().is_none());
    }

    #[test]
    fn location_resolving_after_trigger_is_discarded() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);
        for _ in 0..5 {
            engine.tick(&mut dev);
        }

        let query = dev.location.pop().unwrap();
        assert!(engine.on_location(query, Ok(here())).is_none());
        assert_eq!(dev.notifier.log().shares(), 0);
    }

    #[test]
    fn location_failure_does_not_stop_countdown() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);
        let query = dev.location.pop().unwrap();

        let event = engine.on_location(query, Err(LocationError::PermissionDenied));
        assert!(matches!(event, Some(Event::LocationUnavailable { .. })));
        assert_eq!(engine.state(), AlertState::Arming);

        for _ in 0..5 {
            engine.tick(&mut dev);
        }
        assert_eq!(dev.notifier.log().calls(), 1);
    }

    #[test]
    fn older_fix_does_not_overwrite_newer() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);
        engine.request_location(&mut dev);
        let newer = dev.location.pop_latest().unwrap();
        let older = dev.location.pop().unwrap();

        let newer_fix = Coordinates::new(1.0, 1.0);
        engine.on_location(newer, Ok(newer_fix));
        assert!(engine.on_location(older, Ok(Coordinates::new(2.0, 2.0))).is_none());
        assert_eq!(engine.captured_location(), Some(newer_fix));
    }

    #[test]
    fn direct_trigger_while_arming() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);
        engine.tick(&mut dev);

        assert!(matches!(engine.trigger(&mut dev), Some(Event::AlertTriggered { .. })));
        assert_eq!(dev.notifier.log().calls(), 1);
        assert!(engine.tick(&mut dev).is_none());
        assert_eq!(dev.notifier.log().calls(), 1);
    }

    #[test]
    fn trigger_from_idle_is_ignored() {
        let mut dev = device();
        let mut engine = engine();
        assert!(engine.trigger(&mut dev).is_none());
        assert!(dev.notifier.log().records.is_empty());
    }

    #[test]
    fn share_without_location_only_requests() {
        let mut dev = device();
        let mut engine = engine();

        let event = engine.share_location(&mut dev);
        assert!(matches!(event, Event::LocationRequested { .. }));
        assert_eq!(dev.location.len(), 1);
        assert!(dev.notifier.log().records.is_empty());
    }

    #[test]
    fn share_with_location_dispatches_share_payload() {
        let mut dev = device();
        let mut engine = engine();
        engine.request_location(&mut dev);
        let query = dev.location.pop().unwrap();
        engine.on_location(query, Ok(here()));

        let event = engine.share_location(&mut dev);
        assert!(matches!(event, Event::LocationShared { .. }));
        let record = dev.notifier.log().last().unwrap();
        assert_eq!(record.action, DispatchAction::Share);
        assert!(record.target.contains("currently%20at"));
        assert_eq!(NotificationPayload::share(here()).kind, PayloadKind::Share);
    }

    #[test]
    fn custom_countdown_and_number() {
        let mut dev = device();
        let mut engine = AlertEngine::new(AlertConfig {
            countdown_seconds: 2,
            emergency_number: "112".into(),
        });
        engine.activate(&mut dev);
        engine.tick(&mut dev);
        assert!(matches!(
            engine.tick(&mut dev),
            Some(Event::AlertTriggered { ref emergency_number, .. }) if emergency_number == "112"
        ));
    }

    #[test]
    fn snapshot_follows_the_session() {
        let mut dev = device();
        let mut engine = engine();
        let idle = engine.snapshot();
        assert_eq!(idle.state, AlertState::Idle);
        assert_eq!(idle.emergency_number, "100");

        engine.activate(&mut dev);
        engine.tick(&mut dev);
        let query = dev.location.pop().unwrap();
        engine.on_location(query, Ok(here()));

        let arming = engine.snapshot();
        assert_ne!(arming.session, idle.session);
        assert_eq!(arming.state, AlertState::Arming);
        assert_eq!(arming.remaining_seconds, 4);
        assert_eq!(arming.captured_location, Some(here()));

        engine.cancel(&mut dev);
        let cancelled = engine.snapshot();
        assert_ne!(cancelled.session, arming.session);
        assert_eq!(cancelled.state, AlertState::Idle);
        assert_eq!(cancelled.remaining_seconds, 0);
        assert_eq!(cancelled.captured_location, None);

        let json = serde_json::to_value(&cancelled).unwrap();
        assert_eq!(json["state"], "idle");
    }

    #[test]
    fn shutdown_releases_countdown() {
        let mut dev = device();
        let mut engine = engine();
        engine.activate(&mut dev);
        assert!(engine.shutdown(&mut dev).is_some());
        assert_eq!(dev.timers.live_count(), 0);
        assert!(engine.countdown_timer().is_none());
    }
}
