//! Types shared by the sampleweb round-trip handlers.

mod error;
pub mod log_line;

pub use error::{ErrorKind, RoundTripError, WithKind, APOLOGY};

/// The outcome of a single backend round trip.
pub type RoundTripResult = Result<String, RoundTripError>;
