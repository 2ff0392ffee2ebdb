//! Repeating timers with explicit cancellable handles.
//!
//! Engines do not own threads or closures. They ask a [`Scheduler`] for a
//! repeating timer, keep the returned [`TimerHandle`], and release it exactly
//! once. Fires are fed back as `engine.on_timer(handle)`; a handle the engine
//! no longer holds is ignored, so a fire that was already queued when the
//! timer was cancelled is harmless.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// 1 s SOS countdown.
    Countdown,
    /// Periodic journey location poll.
    JourneyPoll,
}

pub trait Scheduler {
    /// Start a timer that fires every `every` until cancelled. The first fire
    /// happens one period after the call.
    fn start_repeating(&mut self, kind: TimerKind, every: Duration) -> TimerHandle;

    /// Stop a timer. Cancelling an unknown or already cancelled handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Scheduler that only keeps books; the caller fires timers by hand.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    live: BTreeMap<TimerHandle, (TimerKind, Duration)>,
    cancelled: Vec<TimerHandle>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live timers of the given kind, oldest first.
    pub fn live(&self, kind: TimerKind) -> Vec<TimerHandle> {
        self.live
            .iter()
            .filter(|(_, (k, _))| *k == kind)
            .map(|(h, _)| *h)
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn period(&self, handle: TimerHandle) -> Option<Duration> {
        self.live.get(&handle).map(|(_, every)| *every)
    }

    /// Every handle ever cancelled, in order. A handle appears at most once.
    pub fn cancelled(&self) -> &[TimerHandle] {
        &self.cancelled
    }
}

impl Scheduler for ManualScheduler {
    fn start_repeating(&mut self, kind: TimerKind, every: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.live.insert(handle, (kind, every));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if self.live.remove(&handle).is_some() {
            self.cancelled.push(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_and_cancel() {
        let mut timers = ManualScheduler::new();
        let countdown = timers.start_repeating(TimerKind::Countdown, Duration::from_secs(1));
        let poll = timers.start_repeating(TimerKind::JourneyPoll, Duration::from_secs(30));

        assert_ne!(countdown, poll);
        assert_eq!(timers.live(TimerKind::JourneyPoll), vec![poll]);
        assert_eq!(timers.period(countdown), Some(Duration::from_secs(1)));

        timers.cancel(countdown);
        timers.cancel(countdown);
        assert_eq!(timers.period(countdown), None);
        assert_eq!(timers.cancelled(), &[countdown]);
        assert_eq!(timers.live_count(), 1);
    }
}
