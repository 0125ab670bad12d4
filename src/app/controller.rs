use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use super::confirm::Confirm;
use super::notify::{lock, Notifier, Scheduler};
use super::state::{Notification, PhonebookState};
use crate::person::{Person, PersonId, PersonPayload};
use crate::{PersonService, Result};

/// how long a success notification stays visible
pub const SUCCESS_NOTIFICATION: Duration = Duration::from_millis(5000);

/// how long an error notification stays visible, three times longer than a success
pub const ERROR_NOTIFICATION: Duration = Duration::from_millis(15000);

/// how long the notice about a person that is already gone from the server stays visible
pub const REMOVED_NOTIFICATION: Duration = Duration::from_millis(5000);

/// Drives a [`PhonebookState`] from user input and API responses.
///
/// Each operation awaits at most one API call and merges the result into the state afterwards.
/// Operations are not ordered against each other: when two mutations are in flight, whichever
/// response arrives last wins in the local state.
///
/// After [`unmount`](PhonebookController::unmount) the responses of calls that are still in
/// flight are dropped instead of being merged.
pub struct PhonebookController<S: PersonService> {
    state: Arc<Mutex<PhonebookState>>,
    service: S,
    confirm: Box<dyn Confirm>,
    notifier: Notifier,
    generation: AtomicU64,
}

impl<S: PersonService> PhonebookController<S> {
    /// creates a controller with an empty state
    pub fn new(service: S, confirm: impl Confirm + 'static, scheduler: Arc<dyn Scheduler>) -> Self {
        let state = Arc::new(Mutex::new(PhonebookState::default()));
        PhonebookController {
            notifier: Notifier::new(Arc::clone(&state), scheduler),
            state,
            service,
            confirm: Box::new(confirm),
            generation: AtomicU64::new(0),
        }
    }

    /// a copy of the current state, for rendering
    pub fn snapshot(&self) -> PhonebookState {
        lock(&self.state).clone()
    }

    /// the filtered list the view shows
    pub fn persons_to_show(&self) -> Vec<Person> {
        lock(&self.state).persons_to_show().into_iter().cloned().collect()
    }

    /// mirrors the filter input
    pub fn set_filter(&self, text: impl Into<String>) {
        lock(&self.state).filter_text = text.into();
    }

    /// mirrors the name input
    pub fn set_draft_name(&self, name: impl Into<String>) {
        lock(&self.state).draft_name = name.into();
    }

    /// mirrors the number input
    pub fn set_draft_number(&self, number: impl Into<String>) {
        lock(&self.state).draft_number = number.into();
    }

    /// Replaces the cached persons with the server's list.
    ///
    /// # Errors
    /// Failures are not shown to the user, they are returned to the caller.
    pub async fn load(&self) -> Result<()> {
        let generation = self.generation();
        let persons = self.service.get_all().await?;
        if self.is_current(generation) {
            debug!(count = persons.len(), "loaded persons");
            lock(&self.state).persons = persons;
        }
        Ok(())
    }

    /// Submits the draft.
    ///
    /// If a person with exactly the draft name is already cached, the user is asked whether to
    /// replace its number. A confirmed replace updates the cached entry without a notification,
    /// and a failed replace is only logged. Otherwise a new person is created: success appends
    /// it and shows a success notification, failure shows the server's error message.
    ///
    /// Returns the person merged into the state, if any.
    pub async fn submit(&self) -> Option<Person> {
        let (name, number, existing) = {
            let state = lock(&self.state);
            (
                state.draft_name.clone(),
                state.draft_number.clone(),
                state.find_by_name(&state.draft_name).cloned(),
            )
        };

        match existing {
            Some(person) => self.replace_number(person, number).await,
            None => self.create(name, number).await,
        }
    }

    async fn replace_number(&self, person: Person, number: String) -> Option<Person> {
        let prompt = format!(
            "{} is already added to phonebook, replace the old number with a new one?",
            person.name
        );
        if !self.confirm.confirm(&prompt) {
            return None;
        }

        let generation = self.generation();
        let payload = PersonPayload::new(person.name.clone(), number);
        match self.service.update(person.id, &payload).await {
            Ok(returned) if self.is_current(generation) => {
                let mut state = lock(&self.state);
                for cached in state.persons.iter_mut().filter(|p| p.id == returned.id) {
                    *cached = returned.clone();
                }
                Some(returned)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("could not replace the number of {}: {}", person.name, e.user_message());
                None
            }
        }
    }

    async fn create(&self, name: String, number: String) -> Option<Person> {
        let generation = self.generation();
        let result = self.service.create(&PersonPayload::new(name, number)).await;
        if !self.is_current(generation) {
            return None;
        }

        match result {
            Ok(returned) => {
                lock(&self.state).persons.push(returned.clone());
                self.notifier.show(
                    Notification::success(format!("Added {}", returned.name)),
                    SUCCESS_NOTIFICATION,
                );
                Some(returned)
            }
            Err(e) => {
                self.notifier.show(Notification::error(e.user_message()), ERROR_NOTIFICATION);
                None
            }
        }
    }

    /// Deletes the person with the given `id` after the user confirms.
    ///
    /// On failure (e.g. someone else already removed it) an error notification naming the
    /// person is shown and the cached entry is kept.
    ///
    /// Returns `true` if the person was deleted.
    pub async fn delete(&self, id: PersonId) -> bool {
        let target = lock(&self.state).persons.iter().find(|p| p.id == id).cloned();
        let target = match target {
            Some(target) => target,
            None => {
                warn!(%id, "no cached person to delete");
                return false;
            }
        };
        if !self.confirm.confirm(&format!("Delete {} ?", target.name)) {
            return false;
        }

        let generation = self.generation();
        let result = self.service.delete(id).await;
        if !self.is_current(generation) {
            return false;
        }

        match result {
            Ok(()) => {
                lock(&self.state).persons.retain(|p| p.id != id);
                true
            }
            Err(e) => {
                warn!("could not delete {}: {}", target.name, e);
                self.notifier.show(
                    Notification::error(format!(
                        "Information of {} has already been removed from server",
                        target.name
                    )),
                    REMOVED_NOTIFICATION,
                );
                false
            }
        }
    }

    /// Detaches the controller from its view: responses still in flight are ignored and the
    /// pending notification clear is cancelled.
    pub fn unmount(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.notifier.cancel();
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }
}
