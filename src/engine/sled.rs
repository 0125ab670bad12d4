use std::path::Path;

use ::sled::{Db, IVec, Tree};
use tracing::{debug, info, instrument};

use super::PhonebookEngine;
use crate::error::{PhonebookError, Result};
use crate::person::{Person, PersonId, PersonPayload, PersonRecord};

// name of the sled tree that holds the contact records
const PERSONS_TREE: &str = "persons";

// key in the default tree holding the last assigned id
const LAST_ID_KEY: &[u8] = b"last_id";

/// A [`PhonebookEngine`] that persists contact records in a [`sled`] database.
///
/// Records are kept in the `persons` tree. Keys are big-endian encoded ids, so iterating the
/// tree yields records in id order, and values are the JSON encoded name and number.
/// Ids come from a counter kept in the default tree: the first id is `1` and ids are never reused.
///
/// [`sled`]: https://docs.rs/sled/latest/sled/
#[derive(Debug, Clone)]
pub struct SledPhonebook {
    db: Db,
    persons: Tree,
}

impl SledPhonebook {
    /// opens (or creates) a sled database in the given `working_dir`
    #[instrument]
    pub fn open(working_dir: &Path) -> Result<SledPhonebook> {
        info!("opening sled phonebook at {:?}", working_dir);
        let db = ::sled::open(working_dir)?;
        SledPhonebook::new(db)
    }

    /// creates a phonebook on top of an already opened sled database
    pub fn new(db: Db) -> Result<SledPhonebook> {
        let persons = db.open_tree(PERSONS_TREE)?;
        debug!(records = persons.len(), "opened persons tree");
        Ok(SledPhonebook { db, persons })
    }

    /// atomically increments the id counter, returning the new id
    ///
    /// # Errors
    /// returns [`PhonebookError::StringErr`] if the stored counter is not a big-endian `u64`,
    /// the counter is left untouched in that case
    fn next_id(&self) -> Result<PersonId> {
        let mut corrupt = None;
        let last = self.db.update_and_fetch(LAST_ID_KEY, |old: Option<&[u8]>| match old {
            None => Some(1u64.to_be_bytes().to_vec()),
            Some(bytes) => match <[u8; 8]>::try_from(bytes) {
                Ok(array) => Some((u64::from_be_bytes(array) + 1).to_be_bytes().to_vec()),
                Err(_) => {
                    corrupt = Some(bytes.len());
                    Some(bytes.to_vec())
                }
            },
        })?;
        if let Some(len) = corrupt {
            return Err(PhonebookError::StringErr(format!(
                "id counter holds {} bytes instead of 8",
                len
            )));
        }
        match last {
            Some(bytes) => PersonId::from_key(&bytes),
            None => Err(PhonebookError::StringErr("id counter vanished".to_string())),
        }
    }

    fn decode(key: &[u8], value: &[u8]) -> Result<Person> {
        let id = PersonId::from_key(key)?;
        let record: PersonRecord = serde_json::from_slice(value)?;
        Ok(Person::from_record(id, record))
    }
}

impl PhonebookEngine for SledPhonebook {
    fn list(&self) -> Result<Vec<Person>> {
        self.persons
            .iter()
            .map(|entry| {
                let (key, value) = entry?;
                SledPhonebook::decode(&key, &value)
            })
            .collect()
    }

    fn get(&self, id: PersonId) -> Result<Option<Person>> {
        match self.persons.get(id.to_key())? {
            Some(value) => Ok(Some(SledPhonebook::decode(&id.to_key(), &value)?)),
            None => Ok(None),
        }
    }

    fn create(&self, payload: PersonPayload) -> Result<Person> {
        let record = payload.into_record()?;
        let id = self.next_id()?;
        self.persons.insert(id.to_key(), serde_json::to_vec(&record)?)?;
        self.db.flush()?;
        debug!(%id, "created person");
        Ok(Person::from_record(id, record))
    }

    fn update(&self, id: PersonId, payload: PersonPayload) -> Result<Option<Person>> {
        let key = id.to_key();
        loop {
            let current: IVec = match self.persons.get(key)? {
                Some(value) => value,
                None => return Ok(None),
            };
            let existing: PersonRecord = serde_json::from_slice(&current)?;
            let record = payload.merge(&existing)?;
            let encoded = serde_json::to_vec(&record)?;

            // only swap if nobody changed (or removed) the record since it was read
            match self.persons.compare_and_swap(key, Some(current), Some(encoded))? {
                Ok(()) => {
                    self.db.flush()?;
                    debug!(%id, "updated person");
                    return Ok(Some(Person::from_record(id, record)));
                }
                Err(conflict) if conflict.current.is_none() => return Ok(None),
                Err(_) => debug!(%id, "record changed during update, retrying"),
            }
        }
    }

    fn remove(&self, id: PersonId) -> Result<()> {
        if self.persons.remove(id.to_key())?.is_some() {
            self.db.flush()?;
            debug!(%id, "removed person");
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.persons.len())
    }
}
