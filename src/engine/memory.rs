use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use super::PhonebookEngine;
use crate::error::Result;
use crate::person::{Person, PersonId, PersonPayload, PersonRecord};

/// An in-memory [`PhonebookEngine`].
///
/// Records are kept in a concurrent [`DashMap`] and are lost when the last clone is dropped.
/// Ids start at 1 and are never reused.
#[derive(Debug, Clone)]
pub struct MemPhonebook {
    records: Arc<DashMap<u64, PersonRecord>>,
    next_id: Arc<AtomicU64>,
}

impl MemPhonebook {
    /// creates an empty in-memory phonebook
    pub fn new() -> Self {
        MemPhonebook {
            records: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for MemPhonebook {
    fn default() -> Self {
        Self::new()
    }
}

impl PhonebookEngine for MemPhonebook {
    fn list(&self) -> Result<Vec<Person>> {
        let mut persons: Vec<Person> = self
            .records
            .iter()
            .map(|entry| Person::from_record(PersonId::new(*entry.key()), entry.value().clone()))
            .collect();
        persons.sort_by_key(|p| p.id);
        Ok(persons)
    }

    fn get(&self, id: PersonId) -> Result<Option<Person>> {
        Ok(self
            .records
            .get(&id.get())
            .map(|entry| Person::from_record(id, entry.value().clone())))
    }

    fn create(&self, payload: PersonPayload) -> Result<Person> {
        let record = payload.into_record()?;
        let id = PersonId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.records.insert(id.get(), record.clone());
        debug!(%id, "created person");
        Ok(Person::from_record(id, record))
    }

    fn update(&self, id: PersonId, payload: PersonPayload) -> Result<Option<Person>> {
        // holding the entry locks its shard until the new record is written
        match self.records.get_mut(&id.get()) {
            Some(mut entry) => {
                let record = payload.merge(entry.value())?;
                *entry.value_mut() = record.clone();
                debug!(%id, "updated person");
                Ok(Some(Person::from_record(id, record)))
            }
            None => Ok(None),
        }
    }

    fn remove(&self, id: PersonId) -> Result<()> {
        if self.records.remove(&id.get()).is_some() {
            debug!(%id, "removed person");
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}
