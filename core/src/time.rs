//! Time helpers shared by the token types.

use crate::{Error, Result};
use chrono::{Local, NaiveDateTime, TimeZone, Utc};

/// Point in time, always in UTC.
pub type DateTime = chrono::DateTime<Utc>;

/// Current time.
#[inline]
pub fn now() -> DateTime {
    Utc::now()
}

/// Parse an RFC 3339 timestamp such as `2024-01-02T03:04:05Z`.
pub fn parse_rfc3339(s: &str) -> Result<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| Error::response_invalid(format!("invalid rfc3339 time {s:?}")).with_source(e))
}

/// Convert seconds since the unix epoch.
pub fn from_timestamp(secs: i64) -> Result<DateTime> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| Error::response_invalid(format!("invalid unix timestamp {secs}")))
}

/// Parse a timestamp without zone information that was written in the
/// local zone of this machine, using the chrono `format`.
pub fn parse_local(s: &str, format: &str) -> Result<DateTime> {
    let naive = NaiveDateTime::parse_from_str(s, format)
        .map_err(|e| Error::response_invalid(format!("invalid local time {s:?}")).with_source(e))?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|v| v.with_timezone(&Utc))
        .ok_or_else(|| Error::response_invalid(format!("local time {s:?} does not exist")))
}
