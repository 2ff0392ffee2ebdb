mod config;
pub mod database;
mod memory;

pub use config::{AlertConfig, Config, EmergencyNumber, JourneyConfig, LocationConfig, ShareConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::contacts::EmergencyContact;
use crate::error::StoreError;
use crate::journey::Journey;

/// Durable storage for the journey collection.
///
/// Whole-collection semantics: every save replaces what was stored before.
/// Only the journey engine writes through this trait.
pub trait JourneyStore {
    fn load_journeys(&self) -> Result<Vec<Journey>, StoreError>;
    fn save_journeys(&self, journeys: &[Journey]) -> Result<(), StoreError>;
}

/// Durable storage for the emergency contact list, same semantics as [`JourneyStore`].
pub trait ContactStore {
    fn load_contacts(&self) -> Result<Vec<EmergencyContact>, StoreError>;
    fn save_contacts(&self, contacts: &[EmergencyContact]) -> Result<(), StoreError>;
}

/// Returns `~/.config/guardian[-dev]/` based on GUARDIAN_ENV.
///
/// Set GUARDIAN_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the data directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("GUARDIAN_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("guardian-dev")
    } else {
        base_dir.join("guardian")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StoreError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
