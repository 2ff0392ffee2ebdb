pub mod config;
pub mod contacts;
pub mod journey;
pub mod location;
pub mod sos;

use std::sync::Arc;
use std::time::Duration;

use guardian_core::location::{ConfiguredSensor, PendingLocations};
use guardian_core::notify::SystemDispatcher;
use guardian_core::storage::Database;
use guardian_core::{
    AlertEngine, Config, Coordinates, CoreError, Device, DispatchLog, Event, JourneyEngine,
    LocationError, ManualScheduler, Runtime,
};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// How long a one-shot command waits for a position.
const LOCATION_WAIT: Duration = Duration::from_secs(15);

pub fn print_json<T: Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn dispatcher(config: &Config, dry_run: bool) -> SystemDispatcher {
    if dry_run {
        SystemDispatcher::dry_run(config.share.clone())
    } else {
        SystemDispatcher::new(config.share.clone())
    }
}

/// Both engines over the on-disk store, positioned by GUARDIAN_POSITION or the config.
pub fn runtime(config: &Config, dry_run: bool) -> Result<Runtime<Database>, CoreError> {
    let journeys = JourneyEngine::load(Database::open()?, config.journey.clone())?;
    tracing::debug!(dry_run, journeys = journeys.list_history().len(), "runtime ready");
    Ok(Runtime::new(
        AlertEngine::new(config.alert.clone()),
        journeys,
        Arc::new(ConfiguredSensor::from_config(&config.location)),
        dispatcher(config, dry_run),
    ))
}

/// Device for commands that only dial or share.
pub fn dial_device(
    config: &Config,
    dry_run: bool,
) -> Device<PendingLocations, SystemDispatcher, ManualScheduler> {
    Device {
        location: PendingLocations::new(),
        notifier: dispatcher(config, dry_run),
        timers: ManualScheduler::new(),
    }
}

/// Request a fix for the alert engine and wait for it.
pub async fn capture_location(rt: &mut Runtime<Database>) -> Result<Coordinates, CoreError> {
    rt.alert.request_location(&mut rt.device);
    let wait = async {
        while let Some(events) = rt.next_events().await {
            for event in events {
                match event {
                    Event::LocationCaptured { location, .. } => return Ok(location),
                    Event::LocationUnavailable { error, .. } => return Err(error),
                    _ => {}
                }
            }
        }
        Err(LocationError::Unavailable("location service stopped".to_string()))
    };
    match tokio::time::timeout(LOCATION_WAIT, wait).await {
        Ok(result) => result.map_err(CoreError::from),
        Err(_) => Err(LocationError::Timeout.into()),
    }
}

pub fn report_dispatch(log: &DispatchLog) {
    if !log.records.is_empty() {
        eprintln!(
            "Dispatch: {} success, {} failed, {} skipped",
            log.success_count(),
            log.failure_count(),
            log.skipped_count()
        );
    }
}
