//! SQLite-backed key-value store.
//!
//! Collections are kept as JSON documents under fixed keys:
//! - `journeys`: the ordered journey history
//! - `alert_contacts`: the emergency contact list

use std::path::Path;

use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{data_dir, ContactStore, JourneyStore};
use crate::contacts::EmergencyContact;
use crate::error::StoreError;
use crate::journey::Journey;

pub const JOURNEYS_KEY: &str = "journeys";
pub const CONTACTS_KEY: &str = "alert_contacts";

/// SQLite database holding the kv table.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/guardian/guardian.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, StoreError> {
        Self::open_at(&data_dir()?.join("guardian.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, StoreError> {
        match self.kv_get(key)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    fn save_collection<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string(items).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.kv_set(key, &json)?;
        Ok(())
    }
}

impl JourneyStore for Database {
    fn load_journeys(&self) -> Result<Vec<Journey>, StoreError> {
        self.load_collection(JOURNEYS_KEY)
    }

    fn save_journeys(&self, journeys: &[Journey]) -> Result<(), StoreError> {
        self.save_collection(JOURNEYS_KEY, journeys)
    }
}

impl ContactStore for Database {
    fn load_contacts(&self) -> Result<Vec<EmergencyContact>, StoreError> {
        self.load_collection(CONTACTS_KEY)
    }

    fn save_contacts(&self, contacts: &[EmergencyContact]) -> Result<(), StoreError> {
        self.save_collection(CONTACTS_KEY, contacts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", "hello").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "hello");
        db.kv_set("test", "again").unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn empty_store_loads_empty_collections() {
        let db = Database::open_memory().unwrap();
        assert!(db.load_journeys().unwrap().is_empty());
        assert!(db.load_contacts().unwrap().is_empty());
    }

    #[test]
    fn corrupt_collection_is_reported() {
        let db = Database::open_memory().unwrap();
        db.kv_set(JOURNEYS_KEY, "{not json").unwrap();
        assert!(matches!(
            db.load_journeys(),
            Err(StoreError::Corrupt { ref key, .. }) if key == JOURNEYS_KEY
        ));
    }

    #[test]
    fn contacts_roundtrip() {
        let db = Database::open_memory().unwrap();
        let contacts = vec![EmergencyContact::new("Asha", "+91-9876543210", "Sister")];
        db.save_contacts(&contacts).unwrap();
        assert_eq!(db.load_contacts().unwrap(), contacts);
    }
}
