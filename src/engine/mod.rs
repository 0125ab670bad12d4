//! This module provides the storage engines that hold the phonebook's contact records.
//! Two engines are implemented: [`SledPhonebook`], which persists records with the
//! [`sled`] embedded database, and [`MemPhonebook`], an in-memory engine backed by a
//! concurrent HashMap that is used for throw-away servers and tests.
//!
//! [`sled`]: https://docs.rs/sled/latest/sled/
use crate::person::{Person, PersonId, PersonPayload};
use crate::Result;

/// A trait for the basic functionality of a contact storage engine.
///
/// Every method maps to a single atomic store operation, so an engine can be cloned into as
/// many request handlers as needed without any extra locking.
pub trait PhonebookEngine: Clone + Send + Sync + 'static {
    /// Returns every stored record in the store's natural (id) order
    fn list(&self) -> Result<Vec<Person>>;

    /// Gets the record with the given `id`
    ///
    /// Returns `None` if the given `id` does not exist.
    fn get(&self, id: PersonId) -> Result<Option<Person>>;

    /// Validates `payload`, assigns it a new unique id and stores it
    ///
    /// # Errors
    ///
    /// Returns `PhonebookError::Validation` if the name or number is missing or malformed. The
    /// store is not touched in that case.
    fn create(&self, payload: PersonPayload) -> Result<Person>;

    /// Overlays `payload` on the record with the given `id`, validates the result with the same
    /// rules as [`create`](PhonebookEngine::create) and stores it.
    ///
    /// Returns `None`, leaving the store unchanged, if the given `id` does not exist.
    fn update(&self, id: PersonId, payload: PersonPayload) -> Result<Option<Person>>;

    /// Removes the record with the given `id`. Removing an absent id is not an error.
    fn remove(&self, id: PersonId) -> Result<()>;

    /// the number of stored records
    fn count(&self) -> Result<usize>;
}

mod memory;
mod sled;

pub use self::memory::MemPhonebook;
pub use self::sled::SledPhonebook;
