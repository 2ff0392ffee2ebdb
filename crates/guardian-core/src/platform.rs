//! The explicit context object the engines act through.
//!
//! Engines keep no references to device capabilities. Every operation that
//! may query the sensor, dispatch a notification, or touch a timer takes a
//! `&mut dyn Platform`, so the caller decides what those capabilities are.

use crate::location::{LocationProvider, PendingLocations};
use crate::notify::{NotificationDispatcher, SystemDispatcher};
use crate::storage::ShareConfig;
use crate::timer::{ManualScheduler, Scheduler};

pub trait Platform {
    fn location(&mut self) -> &mut dyn LocationProvider;
    fn notifier(&mut self) -> &mut dyn NotificationDispatcher;
    fn timers(&mut self) -> &mut dyn Scheduler;
}

/// Plain bundle of the three device capabilities.
pub struct Device<L, N, S> {
    pub location: L,
    pub notifier: N,
    pub timers: S,
}

impl<L, N, S> Platform for Device<L, N, S>
where
    L: LocationProvider,
    N: NotificationDispatcher,
    S: Scheduler,
{
    fn location(&mut self) -> &mut dyn LocationProvider {
        &mut self.location
    }

    fn notifier(&mut self) -> &mut dyn NotificationDispatcher {
        &mut self.notifier
    }

    fn timers(&mut self) -> &mut dyn Scheduler {
        &mut self.timers
    }
}

/// Fully caller-driven device: queued location queries, dry-run dispatch,
/// hand-fired timers.
pub type ManualDevice = Device<PendingLocations, SystemDispatcher, ManualScheduler>;

impl ManualDevice {
    pub fn manual(share: ShareConfig) -> Self {
        Device {
            location: PendingLocations::new(),
            notifier: SystemDispatcher::dry_run(share),
            timers: ManualScheduler::new(),
        }
    }
}
