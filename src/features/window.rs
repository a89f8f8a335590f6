//! Trailing calendar-month window bounds.

use chrono::{Months, NaiveDateTime};

/// Window length in calendar months
pub const WINDOW_MONTHS: u32 = 12;

/// Fixed divisor for `avg_events_per_month`, independent of how much history exists.
pub const RATE_DIVISOR: f64 = 12.0;

/// `anchor` minus [`WINDOW_MONTHS`] calendar months. The day of month is kept when the target
/// month has it, otherwise clamped to that month's last day (2024-02-29 -> 2023-02-28).
pub fn window_start(anchor: NaiveDateTime) -> NaiveDateTime {
    anchor
        .checked_sub_months(Months::new(WINDOW_MONTHS))
        .unwrap_or(NaiveDateTime::MIN)
}

/// Inclusive on both ends: `[start, anchor]`.
pub fn in_window(ts: NaiveDateTime, start: NaiveDateTime, anchor: NaiveDateTime) -> bool {
    ts >= start && ts <= anchor
}
