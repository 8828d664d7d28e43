//! Human-readable rendering of elapsed time.
//!
//! Every formatter is pure: given the same `TimeDelta` it returns the same
//! string. Negative inputs are treated as zero.

use chrono::TimeDelta;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 3600;

/// A duration split into whole hours, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationParts {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl DurationParts {
    /// Decompose a duration, truncating sub-second precision.
    pub fn from_duration(duration: TimeDelta) -> Self {
        let total = duration.num_seconds().max(0);
        Self {
            hours: total / SECS_PER_HOUR,
            minutes: (total % SECS_PER_HOUR) / SECS_PER_MINUTE,
            seconds: total % SECS_PER_MINUTE,
        }
    }

    /// Recompose the whole number of seconds.
    pub fn total_seconds(&self) -> i64 {
        self.hours * SECS_PER_HOUR + self.minutes * SECS_PER_MINUTE + self.seconds
    }
}

fn whole_seconds(duration: TimeDelta) -> i64 {
    duration.num_seconds().max(0)
}

/// Long form: `"45s"`, `"2m 5s"`, `"2m"`, `"1h 2m"`, `"3h"`.
///
/// Absent or zero durations render as `"-"`.
pub fn format_duration(duration: impl Into<Option<TimeDelta>>) -> String {
    let Some(duration) = duration.into() else {
        return "-".to_string();
    };
    let total = whole_seconds(duration);
    if total == 0 {
        return "-".to_string();
    }
    if total < SECS_PER_MINUTE {
        return format!("{total}s");
    }

    let DurationParts {
        hours,
        minutes,
        seconds,
    } = DurationParts::from_duration(duration);

    match (hours, minutes, seconds) {
        (h, 0, _) if h > 0 => format!("{h}h"),
        (h, m, _) if h > 0 => format!("{h}h {m}m"),
        (_, m, 0) => format!("{m}m"),
        (_, m, s) => format!("{m}m {s}s"),
    }
}

/// Decimal hours with one digit: `"1.5h"`. Zero renders as `"0.0h"`,
/// an absent duration as `"0h"`.
pub fn format_duration_hours(duration: impl Into<Option<TimeDelta>>) -> String {
    match duration.into() {
        Some(duration) => {
            let hours = duration.num_milliseconds().max(0) as f64 / 3_600_000.0;
            format!("{hours:.1}h")
        }
        None => "0h".to_string(),
    }
}

/// Compact form: `"2h05m"`, `"42m"`, `"30s"`; absent or zero is `"-"`.
pub fn format_duration_compact(duration: impl Into<Option<TimeDelta>>) -> String {
    let Some(duration) = duration.into() else {
        return "-".to_string();
    };
    let total = whole_seconds(duration);
    if total == 0 {
        return "-".to_string();
    }
    if total < SECS_PER_MINUTE {
        return format!("{total}s");
    }

    let parts = DurationParts::from_duration(duration);
    if parts.hours > 0 {
        format!("{}h{:02}m", parts.hours, parts.minutes)
    } else {
        format!("{}m", parts.minutes)
    }
}

/// Always `"{h}h {m}m"`, including `"0h 0m"`. Used for package totals.
pub fn format_hours_minutes(duration: TimeDelta) -> String {
    let parts = DurationParts::from_duration(duration);
    format!("{}h {}m", parts.hours, parts.minutes)
}

/// `"{h}h {m}m"` for positive durations, `"-"` otherwise.
pub fn format_admin_duration(duration: TimeDelta) -> String {
    if whole_seconds(duration) > 0 {
        format_hours_minutes(duration)
    } else {
        "-".to_string()
    }
}
