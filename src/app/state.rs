use crate::person::Person;

/// A transient message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// the text to show
    pub message: String,
    /// success messages and error messages are styled differently
    pub is_success: bool,
}

impl Notification {
    /// a success message
    pub fn success(message: impl Into<String>) -> Self {
        Notification {
            message: message.into(),
            is_success: true,
        }
    }

    /// an error message
    pub fn error(message: impl Into<String>) -> Self {
        Notification {
            message: message.into(),
            is_success: false,
        }
    }
}

/// Everything the phonebook view renders from.
///
/// `persons` is a disposable cache of the server's records: replaced wholesale on load and
/// patched after each successful mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhonebookState {
    /// the cached contact records, in the order the server returned them
    pub persons: Vec<Person>,
    /// text the shown list is filtered by
    pub filter_text: String,
    /// uncommitted name input
    pub draft_name: String,
    /// uncommitted number input
    pub draft_number: String,
    /// the notification currently shown, if any
    pub notification: Option<Notification>,
}

impl PhonebookState {
    /// the persons whose name contains the filter text, ignoring case.
    /// All persons are shown when the filter is empty
    pub fn persons_to_show(&self) -> Vec<&Person> {
        if self.filter_text.is_empty() {
            return self.persons.iter().collect();
        }
        let needle = self.filter_text.to_lowercase();
        self.persons
            .iter()
            .filter(|person| person.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// the cached person with exactly this name
    pub fn find_by_name(&self, name: &str) -> Option<&Person> {
        self.persons.iter().find(|person| person.name == name)
    }
}
