//! Formatting of the log lines written by the round-trip handlers.

use chrono::{DateTime, TimeZone};

/// Month/day/year with a 12-hour clock, e.g. `3/7/2024 4:05:09 PM`.
const TIMESTAMP_FORMAT: &str = "%-m/%-d/%Y %-I:%M:%S %p";

/// Formats a timestamp the way it is shown in log lines.
pub fn timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// The line written to the storage blob.
pub fn blob_log_line<Tz: TimeZone>(at: &DateTime<Tz>, site: &str, suffix: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "[{}] This is a log message from {site} and {suffix}.\n",
        timestamp(at)
    )
}

/// The `Content` field of a document-store log record.
pub fn document_log_content<Tz: TimeZone>(at: &DateTime<Tz>, site: &str, suffix: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "[{}] This is a log message from {site} and {suffix}\n.",
        timestamp(at)
    )
}
