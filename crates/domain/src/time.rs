//! Time and timestamp helpers.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// UTC timestamp used for log times, grow start/end, etc.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time, truncated to microseconds so that it
/// survives a round trip through [`to_sortable`] unchanged.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Render a timestamp with fixed microsecond precision and a `Z` suffix.
///
/// The fixed width keeps stored timestamps lexicographically ordered.
#[must_use]
pub fn to_sortable(ts: Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
