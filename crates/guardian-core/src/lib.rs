//! # Guardian Core Library
//!
//! Core logic for Guardian, a personal-safety companion: raise an SOS alert,
//! share your location with trusted contacts, and track a planned journey
//! with periodic location checkpoints. The CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Emergency Alert Engine**: countdown-gated SOS state machine. The caller
//!   feeds timer fires and position results back in
//! - **Journey Tracking Engine**: journey lifecycle, a repeating location poll
//!   for the Active journey, and write-through history
//! - **Platform**: the device capabilities (position queries, dialer and share
//!   links, repeating timers) passed into every engine operation
//! - **Storage**: SQLite key-value store and TOML configuration
//!
//! ## Key Components
//!
//! - [`AlertEngine`]: SOS state machine
//! - [`JourneyEngine`]: journey state machine over a [`JourneyStore`]
//! - [`Runtime`]: both engines on a tokio-backed device
//! - [`Database`]: persistence of journeys and contacts
//! - [`Config`]: application configuration management

pub mod alert;
pub mod contacts;
pub mod error;
pub mod events;
pub mod journey;
pub mod location;
pub mod notify;
pub mod platform;
pub mod runtime;
pub mod storage;
pub mod timer;

pub use alert::{AlertEngine, AlertSession, AlertSnapshot, AlertState, SessionId};
pub use contacts::{ContactBook, EmergencyContact};
pub use error::{ConfigError, CoreError, LocationError, StoreError, ValidationError};
pub use events::Event;
pub use journey::{Journey, JourneyEngine, JourneyId, JourneyStatus};
pub use location::{Coordinates, LocationProvider, LocationQuery, PositionSensor, QueryOrigin};
pub use notify::{DispatchLog, NotificationDispatcher, NotificationPayload, SystemDispatcher};
pub use platform::{Device, ManualDevice, Platform};
pub use runtime::{Runtime, RuntimeEvent};
pub use storage::{Config, ContactStore, Database, JourneyStore, MemoryStore};
pub use timer::{ManualScheduler, Scheduler, TimerHandle, TimerKind};
