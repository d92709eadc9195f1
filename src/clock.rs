//! Timestamp formatting shared by the ledgers, run logs and reports.

use time::macros::format_description;
use time::OffsetDateTime;

/// ISO-8601 UTC with millisecond precision, e.g. `2026-01-02T03:04:05.678Z`.
pub fn iso_millis(at: OffsetDateTime) -> String {
    let fmt = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(&fmt)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn now_iso() -> String {
    iso_millis(OffsetDateTime::now_utc())
}

/// Sortable, filesystem-safe form of an [`iso_millis`] stamp.
pub fn file_safe(iso: &str) -> String {
    iso.replace([':', '.'], "-")
}

/// Whole milliseconds between two instants; negative if `end` precedes `start`.
pub fn millis_between(start: OffsetDateTime, end: OffsetDateTime) -> i64 {
    (end - start).whole_milliseconds() as i64
}
