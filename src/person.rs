use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PhonebookError, Result};

// minimum length of a phone number, hyphen included
const MIN_NUMBER_LEN: usize = 8;

/// The server assigned identifier of a [`Person`].
///
/// On the wire an id is always a canonical decimal string, e.g. `"1"`: no sign and no leading
/// zeros. Any other text is rejected with [`PhonebookError::MalformedIdentifier`], so each
/// record answers to exactly one id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonId(u64);

impl PersonId {
    /// wraps a raw store key
    pub fn new(id: u64) -> Self {
        PersonId(id)
    }

    /// the raw store key
    pub fn get(self) -> u64 {
        self.0
    }

    /// big-endian bytes, so that the store's key order is the id order
    pub(crate) fn to_key(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub(crate) fn from_key(key: &[u8]) -> Result<Self> {
        let bytes: [u8; 8] = key
            .try_into()
            .map_err(|_| PhonebookError::StringErr(format!("invalid key length {} in store", key.len())))?;
        Ok(PersonId(u64::from_be_bytes(bytes)))
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PersonId {
    type Err = PhonebookError;

    fn from_str(s: &str) -> Result<Self> {
        let canonical = !s.is_empty()
            && s.bytes().all(|b| b.is_ascii_digit())
            && (s == "0" || !s.starts_with('0'));
        if !canonical {
            return Err(PhonebookError::MalformedIdentifier(s.to_string()));
        }
        s.parse::<u64>()
            .map(PersonId)
            .map_err(|_| PhonebookError::MalformedIdentifier(s.to_string()))
    }
}

impl TryFrom<String> for PersonId {
    type Error = PhonebookError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PersonId> for String {
    fn from(id: PersonId) -> Self {
        id.to_string()
    }
}

/// A contact record as it is returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// server assigned, immutable once assigned
    pub id: PersonId,
    /// the contact's name, need not be unique
    pub name: String,
    /// the contact's phone number
    pub number: String,
}

impl Person {
    pub(crate) fn from_record(id: PersonId, record: PersonRecord) -> Self {
        Person {
            id,
            name: record.name,
            number: record.number,
        }
    }
}

/// The request body of a create or update.
///
/// Both fields are optional so that an update can carry a partial record. A create with a
/// missing field fails validation. Any extra fields (e.g. an `id`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonPayload {
    /// the new name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// the new number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
}

impl PersonPayload {
    /// a payload carrying both fields
    pub fn new(name: impl Into<String>, number: impl Into<String>) -> Self {
        PersonPayload {
            name: Some(name.into()),
            number: Some(number.into()),
        }
    }

    /// converts this payload into a validated record for a create
    pub(crate) fn into_record(self) -> Result<PersonRecord> {
        let record = PersonRecord {
            name: self.name.unwrap_or_default(),
            number: self.number.unwrap_or_default(),
        };
        record.validate()?;
        Ok(record)
    }

    /// overlays the fields present in this payload on top of `existing` and validates the result
    pub(crate) fn merge(&self, existing: &PersonRecord) -> Result<PersonRecord> {
        let record = PersonRecord {
            name: self.name.clone().unwrap_or_else(|| existing.name.clone()),
            number: self.number.clone().unwrap_or_else(|| existing.number.clone()),
        };
        record.validate()?;
        Ok(record)
    }
}

/// The stored form of a contact, everything but the id (which is the store key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct PersonRecord {
    pub name: String,
    pub number: String,
}

impl PersonRecord {
    /// checks the name and number, collecting a message for every failing field
    fn validate(&self) -> Result<()> {
        let mut failures = vec![];
        if self.name.trim().is_empty() {
            failures.push("name: name is required".to_string());
        }
        if self.number.trim().is_empty() {
            failures.push("number: number is required".to_string());
        } else if !is_phone_number(&self.number) {
            failures.push(format!("number: {} is not a valid phone number", self.number));
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PhonebookError::Validation(format!(
                "person validation failed: {}",
                failures.join(", ")
            )))
        }
    }
}

/// a phone number is 2 or 3 digits, a hyphen, then more digits, at least 8 characters in total.
/// e.g. `09-1234556` and `040-22334455` are valid, `1234556` and `1-22-334455` are not
pub fn is_phone_number(number: &str) -> bool {
    if number.len() < MIN_NUMBER_LEN {
        return false;
    }
    match number.split_once('-') {
        Some((area, rest)) => {
            (2..=3).contains(&area.len())
                && area.bytes().all(|b| b.is_ascii_digit())
                && !rest.is_empty()
                && rest.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}
