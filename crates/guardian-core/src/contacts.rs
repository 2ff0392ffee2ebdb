//! Emergency contacts the user can dial directly.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::platform::Platform;
use crate::storage::ContactStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

impl EmergencyContact {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        relationship: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("contact-{}", uuid::Uuid::new_v4()),
            name: name.into(),
            phone: phone.into(),
            relationship: relationship.into(),
        }
    }
}

/// Contact list with write-through persistence.
pub struct ContactBook<S: ContactStore> {
    store: S,
    contacts: Vec<EmergencyContact>,
}

impl<S: ContactStore> ContactBook<S> {
    pub fn load(store: S) -> Result<Self> {
        let contacts = store.load_contacts()?;
        Ok(Self { store, contacts })
    }

    pub fn list(&self) -> &[EmergencyContact] {
        &self.contacts
    }

    pub fn get(&self, id: &str) -> Option<&EmergencyContact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// All three fields are required.
    pub fn add(&mut self, name: &str, phone: &str, relationship: &str) -> Result<EmergencyContact> {
        let contact = EmergencyContact::new(
            required(name, "name")?,
            required(phone, "phone")?,
            required(relationship, "relationship")?,
        );
        self.contacts.push(contact.clone());
        if let Err(e) = self.store.save_contacts(&self.contacts) {
            self.contacts.pop();
            return Err(e.into());
        }
        tracing::info!(id = %contact.id, "contact added");
        Ok(contact)
    }

    pub fn remove(&mut self, id: &str) -> Result<EmergencyContact> {
        let index = self
            .contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| not_found(id))?;
        let removed = self.contacts.remove(index);
        if let Err(e) = self.store.save_contacts(&self.contacts) {
            self.contacts.insert(index, removed);
            return Err(e.into());
        }
        tracing::info!(%id, "contact removed");
        Ok(removed)
    }

    pub fn call(&self, id: &str, platform: &mut dyn Platform) -> Result<Event> {
        let contact = self.get(id).ok_or_else(|| not_found(id))?;
        platform.notifier().call(&contact.phone);
        Ok(Event::CallPlaced {
            number: contact.phone.clone(),
            at: chrono::Utc::now(),
        })
    }
}

fn required(value: &str, field: &'static str) -> std::result::Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

fn not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        kind: "contact",
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ManualDevice;
    use crate::storage::{MemoryStore, ShareConfig};

    fn book() -> ContactBook<MemoryStore> {
        ContactBook::load(MemoryStore::new()).unwrap()
    }

    #[test]
    fn add_persists_trimmed_contact() {
        let mut book = book();
        let contact = book.add(" Asha ", "+91 98765 43210", "Sister").unwrap();
        assert_eq!(contact.name, "Asha");
        assert!(contact.id.starts_with("contact-"));
        assert_eq!(book.store().load_contacts().unwrap(), vec![contact]);
    }

    #[test]
    fn add_requires_every_field() {
        let mut book = book();
        for (name, phone, rel, field) in [
            ("", "1", "x", "name"),
            ("a", " ", "x", "phone"),
            ("a", "1", "", "relationship"),
        ] {
            let err = book.add(name, phone, rel).unwrap_err();
            assert!(matches!(
                err,
                CoreError::InvalidInput(ValidationError::EmptyField { field: f }) if f == field
            ));
        }
        assert!(book.list().is_empty());
        assert_eq!(book.store().writes(), 0);
    }

    #[test]
    fn remove_unknown_is_not_found() {
        let mut book = book();
        assert!(matches!(
            book.remove("contact-missing"),
            Err(CoreError::NotFound { kind: "contact", .. })
        ));
    }

    #[test]
    fn remove_keeps_order_of_the_rest() {
        let mut book = book();
        let a = book.add("A", "1", "x").unwrap();
        let b = book.add("B", "2", "x").unwrap();
        let c = book.add("C", "3", "x").unwrap();

        book.remove(&b.id).unwrap();
        assert_eq!(book.list(), &[a, c]);
        assert_eq!(book.store().load_contacts().unwrap().len(), 2);
    }

    #[test]
    fn failed_write_leaves_list_unchanged() {
        let mut book = book();
        let a = book.add("A", "1", "x").unwrap();
        book.store().fail_writes(true);

        assert!(book.add("B", "2", "x").is_err());
        assert!(book.remove(&a.id).is_err());
        assert_eq!(book.list(), std::slice::from_ref(&a));
    }

    #[test]
    fn call_dials_contact_phone() {
        let mut dev = ManualDevice::manual(ShareConfig::default());
        let mut book = book();
        let a = book.add("A", "+91 100", "x").unwrap();

        book.call(&a.id, &mut dev).unwrap();
        assert_eq!(dev.notifier.log().last().unwrap().target, "tel:+91100");
        assert!(book.call("nope", &mut dev).is_err());
    }
}
