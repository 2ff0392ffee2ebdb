//! Tokio-backed platform and event loop.
//!
//! Timers and position queries complete on tokio tasks and report back over
//! one unbounded channel. [`Runtime::next_events`] takes the next report and
//! hands it to the engine that owns it, so all engine code runs on the task
//! that polls the runtime. Use a `current_thread` runtime.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::alert::AlertEngine;
use crate::error::LocationError;
use crate::events::Event;
use crate::journey::JourneyEngine;
use crate::location::{Coordinates, LocationProvider, LocationQuery, PositionSensor, QueryOrigin};
use crate::notify::SystemDispatcher;
use crate::platform::Device;
use crate::storage::JourneyStore;
use crate::timer::{Scheduler, TimerHandle, TimerKind};

/// Completion reported by a timer or position task.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    TimerFired(TimerHandle),
    LocationResolved {
        query: LocationQuery,
        result: Result<Coordinates, LocationError>,
    },
}

/// One interval task per live handle; cancel aborts the task.
pub struct TokioScheduler {
    next_id: u64,
    tx: UnboundedSender<RuntimeEvent>,
    tasks: HashMap<TimerHandle, JoinHandle<()>>,
}

impl TokioScheduler {
    pub fn new(tx: UnboundedSender<RuntimeEvent>) -> Self {
        Self {
            next_id: 0,
            tx,
            tasks: HashMap::new(),
        }
    }

    pub fn live_count(&self) -> usize {
        self.tasks.len()
    }
}

impl Scheduler for TokioScheduler {
    fn start_repeating(&mut self, kind: TimerKind, every: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + every, every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(RuntimeEvent::TimerFired(handle)).is_err() {
                    break;
                }
            }
        });
        tracing::debug!(?handle, ?kind, ?every, "timer started");
        self.tasks.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.tasks.remove(&handle) {
            task.abort();
            tracing::debug!(?handle, "timer cancelled");
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

/// Runs the blocking sensor on tokio's blocking pool for each query.
pub struct SensorLocationProvider {
    next_id: u64,
    sensor: Arc<dyn PositionSensor>,
    tx: UnboundedSender<RuntimeEvent>,
}

impl SensorLocationProvider {
    pub fn new(sensor: Arc<dyn PositionSensor>, tx: UnboundedSender<RuntimeEvent>) -> Self {
        Self {
            next_id: 0,
            sensor,
            tx,
        }
    }
}

impl LocationProvider for SensorLocationProvider {
    fn request(&mut self, origin: QueryOrigin) -> LocationQuery {
        self.next_id += 1;
        let query = LocationQuery {
            id: self.next_id,
            origin,
        };
        let sensor = Arc::clone(&self.sensor);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = tokio::task::spawn_blocking(move || sensor.current_position())
                .await
                .unwrap_or_else(|e| Err(LocationError::Failed(e.to_string())));
            // The receiver is gone once the runtime shuts down.
            let _ = tx.send(RuntimeEvent::LocationResolved { query, result });
        });
        tracing::debug!(query = query.id, ?origin, "location requested");
        query
    }
}

pub type RuntimeDevice = Device<SensorLocationProvider, SystemDispatcher, TokioScheduler>;

/// Both engines on a tokio-backed device.
pub struct Runtime<S: JourneyStore> {
    pub alert: AlertEngine,
    pub journeys: JourneyEngine<S>,
    pub device: RuntimeDevice,
    rx: UnboundedReceiver<RuntimeEvent>,
}

impl<S: JourneyStore> Runtime<S> {
    pub fn new(
        alert: AlertEngine,
        journeys: JourneyEngine<S>,
        sensor: Arc<dyn PositionSensor>,
        notifier: SystemDispatcher,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let device = Device {
            location: SensorLocationProvider::new(sensor, tx.clone()),
            notifier,
            timers: TokioScheduler::new(tx),
        };
        Self {
            alert,
            journeys,
            device,
            rx,
        }
    }

    /// Wait for the next timer fire or position result and apply it.
    ///
    /// Returns the events it produced, possibly none for a stale report.
    /// Returns `None` only if every sender is gone.
    pub async fn next_events(&mut self) -> Option<Vec<Event>> {
        let report = self.rx.recv().await?;
        Some(self.apply(report))
    }

    pub fn apply(&mut self, report: RuntimeEvent) -> Vec<Event> {
        match report {
            RuntimeEvent::TimerFired(handle) => {
                let alert = self.alert.on_timer(handle, &mut self.device);
                let journey = self.journeys.on_timer(handle, &mut self.device);
                alert.into_iter().chain(journey).collect()
            }
            RuntimeEvent::LocationResolved { query, result } => {
                let event = match query.origin {
                    QueryOrigin::Alert { .. } => self.alert.on_location(query, result),
                    QueryOrigin::Journey { .. } => self.journeys.on_location(query, result),
                };
                event.into_iter().collect()
            }
        }
    }

    /// Release every timer. An arming SOS is cancelled.
    pub fn shutdown(&mut self) -> Option<Event> {
        self.journeys.shutdown(&mut self.device);
        self.alert.shutdown(&mut self.device)
    }
}
