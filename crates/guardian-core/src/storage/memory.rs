//! In-memory store for tests and ephemeral sessions.

use std::cell::{Cell, RefCell};

use super::{ContactStore, JourneyStore};
use crate::contacts::EmergencyContact;
use crate::error::StoreError;
use crate::journey::Journey;

/// Keeps the serialized mirror in memory and counts writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    journeys: RefCell<Vec<Journey>>,
    contacts: RefCell<Vec<EmergencyContact>>,
    writes: Cell<usize>,
    fail_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journeys(journeys: Vec<Journey>) -> Self {
        let store = Self::default();
        *store.journeys.borrow_mut() = journeys;
        store
    }

    /// Number of successful saves of either collection.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    /// Make every following save fail, as a full disk would.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Copy of the persisted journeys.
    pub fn journeys(&self) -> Vec<Journey> {
        self.journeys.borrow().clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::ReadOnly("writes disabled".to_string()));
        }
        Ok(())
    }
}

impl JourneyStore for MemoryStore {
    fn load_journeys(&self) -> Result<Vec<Journey>, StoreError> {
        Ok(self.journeys.borrow().clone())
    }

    fn save_journeys(&self, journeys: &[Journey]) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.journeys.borrow_mut() = journeys.to_vec();
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl ContactStore for MemoryStore {
    fn load_contacts(&self) -> Result<Vec<EmergencyContact>, StoreError> {
        Ok(self.contacts.borrow().clone())
    }

    fn save_contacts(&self, contacts: &[EmergencyContact]) -> Result<(), StoreError> {
        self.check_writable()?;
        *self.contacts.borrow_mut() = contacts.to_vec();
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}
