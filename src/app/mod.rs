//! The client side of the phonebook: an explicit state container and the controller that keeps
//! it in sync with the REST API.
//!
//! [`PhonebookController`] holds the contact list, the filter and the draft form fields in a
//! [`PhonebookState`], issues the API calls through a [`PersonService`], asks the user through an
//! injected [`Confirm`] capability before replacing or deleting anything, and shows transient
//! [`Notification`]s that clear themselves through a [`Scheduler`].
//!
//! [`PersonService`]: ../trait.PersonService.html

mod confirm;
mod controller;
mod notify;
mod state;
pub mod view;

pub use self::confirm::{Confirm, TerminalConfirm};
pub use self::controller::{
    PhonebookController, ERROR_NOTIFICATION, REMOVED_NOTIFICATION, SUCCESS_NOTIFICATION,
};
pub use self::notify::{ManualScheduler, Notifier, Scheduler, TimerHandle, TokioScheduler};
pub use self::state::{Notification, PhonebookState};
