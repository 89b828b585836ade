//! Timestamp helpers

use chrono::{DateTime, Utc};

/// Current time as fractional seconds since the Unix epoch
pub fn now_timestamp() -> f64 {
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) / 1_000_000.0
}

/// Render an epoch timestamp as `YYYY-MM-DD HH:MM:SS` (UTC)
///
/// Returns `None` for values outside chrono's representable range.
pub fn format_timestamp(timestamp: f64) -> Option<String> {
    let secs = timestamp.floor();
    let nanos = ((timestamp - secs) * 1_000_000_000.0) as u32;
    DateTime::<Utc>::from_timestamp(secs as i64, nanos)
        .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S").to_string())
}
