//! ## herald-core::time
//! **Wall-clock timestamps in nanoseconds since the Unix epoch (UTC)**

use chrono::{DateTime, Utc};

/// asctime layout, day of month padded with a space.
const DATE_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// Current time in ns. Saturates at `i64::MAX` past the year 2262.
pub fn now_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}

/// Renders `ns` as `Thu Jan  1 00:00:00 1970`.
pub fn format_ns(ns: i64) -> String {
    DateTime::from_timestamp_nanos(ns)
        .format(DATE_FORMAT)
        .to_string()
}
