use std::fmt;

/// The fixed text shown to users before the raw failure message.
pub const APOLOGY: &str = "Sorry, something went wrong. Please try again later.\n";

/// The stage of a round trip that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The deployment configuration was missing or malformed.
    Configuration,
    /// No credential could be obtained.
    Credential,
    /// A container, database or blob could not be looked up or created.
    Provision,
    /// Writing the log record failed.
    Write,
    /// Reading the log record back failed.
    Read,
    /// The record that was just written could not be found.
    NotFound,
}

impl ErrorKind {
    /// Whether the failure happened before any backend was contacted.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Configuration | Self::Credential)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Configuration => "configuration",
            Self::Credential => "credential",
            Self::Provision => "provision",
            Self::Write => "write",
            Self::Read => "read",
            Self::NotFound => "not-found",
        };
        f.write_str(s)
    }
}

/// A failed round trip against a backing service.
#[derive(Clone, Debug, thiserror::Error)]
#[error("{message}")]
pub struct RoundTripError {
    kind: ErrorKind,
    message: String,
}

impl RoundTripError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Wraps an error chain, keeping every cause in the message.
    pub fn from_anyhow(kind: ErrorKind, err: anyhow::Error) -> Self {
        Self::new(kind, format!("{err:#}"))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The text returned to the caller in place of the round-trip result.
    pub fn user_message(&self) -> String {
        format!("{APOLOGY}{}", self.message)
    }
}

/// Attaches an [`ErrorKind`] to a fallible backend call.
pub trait WithKind<T> {
    fn kind(self, kind: ErrorKind) -> Result<T, RoundTripError>;
}

impl<T> WithKind<T> for anyhow::Result<T> {
    fn kind(self, kind: ErrorKind) -> Result<T, RoundTripError> {
        self.map_err(|err| RoundTripError::from_anyhow(kind, err))
    }
}
