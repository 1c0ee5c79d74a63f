//! Conversions between fractional seconds and [`TimeDelta`].
//!
//! Controllers integrate over `f64` seconds while deadlines are stored as
//! absolute [`chrono`] timestamps.

use chrono::{DateTime, TimeDelta, Utc};

/// Convert fractional seconds to a [`TimeDelta`] with millisecond precision.
///
/// Negative, NaN, and infinite inputs map to zero. Values beyond the
/// representable range saturate at [`TimeDelta::MAX`].
#[allow(clippy::cast_possible_truncation)]
pub fn seconds_to_delta(seconds: f64) -> TimeDelta {
    if !seconds.is_finite() || seconds <= 0.0 {
        return TimeDelta::zero();
    }
    let millis = (seconds * 1000.0).round();
    if millis >= 9.0e15 {
        return TimeDelta::MAX;
    }
    TimeDelta::try_milliseconds(millis as i64).unwrap_or(TimeDelta::MAX)
}

/// Convert a [`TimeDelta`] to fractional seconds. Negative deltas stay negative.
#[allow(clippy::cast_precision_loss)]
pub fn delta_seconds(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

/// The instant `seconds` after `from`, saturating at the end of time.
pub fn deadline_after(from: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    from.checked_add_signed(seconds_to_delta(seconds))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Fractional seconds from `earlier` to `later`. Negative if `later` is earlier.
pub fn seconds_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    delta_seconds(later.signed_duration_since(earlier))
}
