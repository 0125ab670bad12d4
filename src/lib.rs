#![deny(missing_docs)]
//! A phonebook: a REST service that persists name/number contact records, and the client side
//! state controller that keeps a local copy of them in sync.
//!
//! This crate provides the [`PhonebookServer`] and its storage engines, the
//! [`HttpPersonService`] client, and the [`app`] module with the client state controller, as well
//! as a [`phonebook-server`] and [`phonebook-client`] executable.
//!
//! ## Supported Operations
//! The server exposes the collection at `/api/persons` and each record at `/api/persons/{id}`:
//!
//! - `GET /api/persons` lists every record
//! - `GET /api/persons/{id}` returns one record
//! - `POST /api/persons` creates a record, the server assigns its id
//! - `PUT /api/persons/{id}` replaces a record's fields
//! - `DELETE /api/persons/{id}` removes a record, deleting an absent record is not an error
//!
//! Records are JSON objects: `{"id": "1", "name": "Ada", "number": "040-1234567"}`.
//! See the [`PhonebookEngine`] trait and the [`Person`] and [`PersonPayload`] types for more
//! information on the structure of these operations.
//!
//! ## Errors
//! Every failure is a [`PhonebookError`]. The server maps them onto status codes in one place:
//! validation errors and malformed ids are `400`, unknown ids are `404`, and anything else (a
//! failing store) is a `500`. Requests for paths no route handles get a `404` with the body
//! `{"error": "unknown endpoint"}`.
//!
//! ## Storage Engines
//! [`SledPhonebook`] keeps records in a [`sled`] database in a data directory, [`MemPhonebook`]
//! keeps them in memory.
//!
//! ## Client
//! [`app::PhonebookController`] holds the contact list, the filter text, the draft form and the
//! current notification. It adds a person, or replaces the number of an existing person with the
//! same name after asking for confirmation, and deletes persons after asking for confirmation.
//! Notifications clear themselves after 5 seconds (success) or 15 seconds (errors).
//!
//! [`sled`]: https://docs.rs/sled/latest/sled/
//! [`phonebook-server`]: ./phonebook-server.rs
//! [`phonebook-client`]: ./phonebook-client.rs

pub use client::{HttpPersonService, PersonService};
pub use engine::{MemPhonebook, PhonebookEngine, SledPhonebook};
pub use error::{PhonebookError, Result};
pub use person::{is_phone_number, Person, PersonId, PersonPayload};
pub use server::PhonebookServer;

pub mod app;
mod client;
mod engine;
mod error;
mod person;
mod server;
