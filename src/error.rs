use thiserror::Error;

/// type alias for all operations on the phonebook that could fail with a [`PhonebookError`]
pub type Result<T> = std::result::Result<T, PhonebookError>;

/// The Error variants used throughout the phonebook.
/// It wraps any lower level errors from third party crates (sled, serde_json, reqwest) and adds
/// the resource level failures that the server maps onto HTTP status codes
#[derive(Error, Debug)]
pub enum PhonebookError {
    /// a contact record failed validation, contains the field level message
    #[error("{0}")]
    Validation(String),

    /// an identifier could not be parsed into the store's key type
    #[error("malformatted id: {0}")]
    MalformedIdentifier(String),

    /// no record exists for the requested identifier
    #[error("{0}")]
    NotFound(String),

    /// the sled store failed
    #[error("store unavailable: {0}")]
    Store(#[from] sled::Error),

    /// Serde Error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// variant for errors caused from file or socket IO
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// the http client could not complete a request
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// the server answered with a non success status
    #[error("server responded {status}: {message}")]
    Remote {
        /// the HTTP status code
        status: u16,
        /// the error message taken from the response body
        message: String,
    },

    /// a command line option could not be parsed
    #[error("{0}")]
    Parsing(String),

    /// catch-all for errors that only carry a description
    #[error("{0}")]
    StringErr(String),
}

impl PhonebookError {
    /// the message that should be shown to a user for this error.
    ///
    /// Errors returned by the server carry their own message, everything else uses its display
    /// form.
    pub fn user_message(&self) -> String {
        match self {
            PhonebookError::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
