//! Journey tracking engine.
//!
//! Owns the journey collection and the location poll of the one Active
//! journey. Every lifecycle transition writes the whole collection through
//! the [`JourneyStore`]; poll results only update memory and reach the store
//! with the next transition.
//!
//! ## State Transitions
//!
//! ```text
//! (none) --start--> Active --complete--> Completed
//!                   Active --cancel----> Cancelled
//! ```

use chrono::Utc;

use super::model::{Journey, JourneyId, JourneyStatus};
use crate::error::{CoreError, LocationError, Result, StoreError, ValidationError};
use crate::events::Event;
use crate::location::{Coordinates, LocationQuery, QueryOrigin};
use crate::notify::NotificationPayload;
use crate::platform::Platform;
use crate::storage::{JourneyConfig, JourneyStore};
use crate::timer::{TimerHandle, TimerKind};

pub struct JourneyEngine<S: JourneyStore> {
    store: S,
    config: JourneyConfig,
    journeys: Vec<Journey>,
    /// Held only while a journey is Active and polling.
    poll: Option<TimerHandle>,
    /// Query id behind the current `last_known_location`.
    fix_query: Option<u64>,
}

impl<S: JourneyStore> JourneyEngine<S> {
    /// Restore the persisted collection. Polling is not restarted; see [`Self::resume`].
    pub fn load(store: S, config: JourneyConfig) -> Result<Self> {
        let journeys = store.load_journeys()?;
        tracing::debug!(count = journeys.len(), "journeys loaded");
        Ok(Self {
            store,
            config,
            journeys,
            poll: None,
            fix_query: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// All journeys in creation order.
    pub fn list_history(&self) -> &[Journey] {
        &self.journeys
    }

    pub fn current(&self) -> Option<&Journey> {
        self.journeys.iter().rev().find(|j| j.is_active())
    }

    pub fn poll_timer(&self) -> Option<TimerHandle> {
        self.poll
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start_journey(
        &mut self,
        start_location: &str,
        end_location: &str,
        estimated_duration_minutes: u32,
        platform: &mut dyn Platform,
    ) -> Result<Event> {
        let start_location = required(start_location, "start_location")?;
        let end_location = required(end_location, "end_location")?;
        if estimated_duration_minutes == 0 {
            return Err(ValidationError::InvalidValue {
                field: "estimated_duration_minutes",
                message: "must be at least 1 minute".to_string(),
            }
            .into());
        }
        if let Some(active) = self.current() {
            return Err(CoreError::ConflictingActiveJourney { active: active.id });
        }

        let journey = Journey::start(start_location, end_location, estimated_duration_minutes);
        let id = journey.id;
        self.journeys.push(journey);
        if let Err(e) = self.persist() {
            self.journeys.pop();
            return Err(e.into());
        }

        self.fix_query = None;
        self.start_polling(platform);
        self.query(id, platform);

        let journey = &self.journeys[self.journeys.len() - 1];
        tracing::info!(journey = %id, from = %journey.start_location, to = %journey.end_location, "journey started");
        Ok(Event::JourneyStarted {
            journey: id,
            start_location: journey.start_location.clone(),
            end_location: journey.end_location.clone(),
            estimated_duration_minutes,
            at: journey.start_time,
        })
    }

    pub fn complete_journey(&mut self, platform: &mut dyn Platform) -> Result<Event> {
        self.finish(JourneyStatus::Completed, platform)
    }

    pub fn cancel_journey(&mut self, platform: &mut dyn Platform) -> Result<Event> {
        self.finish(JourneyStatus::Cancelled, platform)
    }

    /// Share the Active journey's last known location. Without one, a query
    /// is fired and nothing is shared.
    pub fn share_current_location(&mut self, platform: &mut dyn Platform) -> Result<Event> {
        let journey = self.current().ok_or(CoreError::NoActiveJourney)?;
        let id = journey.id;
        match journey.last_known_location {
            Some(location) => {
                let payload = NotificationPayload::share(location).with_note(format!(
                    "On my way from {} to {}.",
                    journey.start_location, journey.end_location
                ));
                platform.notifier().share_via_message(&payload);
                Ok(Event::LocationShared {
                    location,
                    at: Utc::now(),
                })
            }
            None => {
                tracing::info!(journey = %id, "no location yet, requesting one instead of sharing");
                let query = self.query(id, platform);
                Ok(Event::LocationRequested {
                    query_id: query.id,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Dial the configured journey emergency number.
    pub fn call_emergency(&self, platform: &mut dyn Platform) -> Event {
        let number = &self.config.emergency_number;
        tracing::info!(%number, active = self.current().is_some(), "emergency call during journey");
        platform.notifier().call(number);
        Event::CallPlaced {
            number: number.clone(),
            at: Utc::now(),
        }
    }

    /// Route a timer fire. Only the held poll handle issues a query.
    pub fn on_timer(&mut self, handle: TimerHandle, platform: &mut dyn Platform) -> Option<Event> {
        if self.poll != Some(handle) {
            tracing::debug!(?handle, "ignoring stale journey poll");
            return None;
        }
        let id = self.current()?.id;
        let query = self.query(id, platform);
        Some(Event::LocationRequested {
            query_id: query.id,
            at: Utc::now(),
        })
    }

    /// Apply a position result to the journey that asked for it, if it is
    /// still Active. Failures leave the journey untouched.
    pub fn on_location(
        &mut self,
        query: LocationQuery,
        result: std::result::Result<Coordinates, LocationError>,
    ) -> Option<Event> {
        let QueryOrigin::Journey { journey } = query.origin else {
            return None;
        };
        let Some(target) = self
            .journeys
            .iter_mut()
            .find(|j| j.id == journey && j.is_active())
        else {
            tracing::debug!(%journey, "discarding location for inactive journey");
            return None;
        };
        match result {
            Ok(location) => {
                if self.fix_query.is_some_and(|held| held > query.id) {
                    tracing::debug!(query = query.id, "discarding out-of-order location result");
                    return None;
                }
                target.last_known_location = Some(location);
                self.fix_query = Some(query.id);
                tracing::debug!(%journey, %location, "journey location updated");
                Some(Event::JourneyLocationUpdated {
                    journey,
                    location,
                    at: Utc::now(),
                })
            }
            Err(error) => {
                tracing::warn!(%journey, %error, "location unavailable");
                Some(Event::LocationUnavailable {
                    error,
                    at: Utc::now(),
                })
            }
        }
    }

    /// Restart polling for a journey left Active by a previous process.
    pub fn resume(&mut self, platform: &mut dyn Platform) -> Option<Event> {
        if self.poll.is_some() {
            return None;
        }
        let id = self.current()?.id;
        self.start_polling(platform);
        self.query(id, platform);
        tracing::info!(journey = %id, "journey tracking resumed");
        Some(Event::JourneyResumed {
            journey: id,
            at: Utc::now(),
        })
    }

    /// Release the poll. The Active journey stays Active in the store.
    pub fn shutdown(&mut self, platform: &mut dyn Platform) {
        self.release_poll(platform);
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self, status: JourneyStatus, platform: &mut dyn Platform) -> Result<Event> {
        let index = self
            .journeys
            .iter()
            .rposition(|j| j.is_active())
            .ok_or(CoreError::NoActiveJourney)?;

        self.journeys[index].status = status;
        if let Err(e) = self.persist() {
            self.journeys[index].status = JourneyStatus::Active;
            return Err(e.into());
        }
        self.release_poll(platform);

        let journey = self.journeys[index].id;
        tracing::info!(%journey, %status, "journey ended");
        Ok(Event::JourneyEnded {
            journey,
            status,
            at: Utc::now(),
        })
    }

    fn persist(&self) -> std::result::Result<(), StoreError> {
        self.store.save_journeys(&self.journeys).inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist journeys");
        })
    }

    fn start_polling(&mut self, platform: &mut dyn Platform) {
        self.release_poll(platform);
        self.poll = Some(
            platform
                .timers()
                .start_repeating(TimerKind::JourneyPoll, self.config.poll_interval()),
        );
    }

    fn release_poll(&mut self, platform: &mut dyn Platform) {
        if let Some(handle) = self.poll.take() {
            platform.timers().cancel(handle);
        }
    }

    fn query(&mut self, journey: JourneyId, platform: &mut dyn Platform) -> LocationQuery {
        platform.location().request(QueryOrigin::Journey { journey })
    }
}

fn required(value: &str, field: &'static str) -> std::result::Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}
