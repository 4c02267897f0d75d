use serde::{Deserialize, Serialize};

/// How the time handed to an evaluation is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeFormat {
    /// Real elapsed seconds, wrapped to the clip duration.
    #[default]
    Seconds,
    /// Already normalized into `[0, 1)`.
    Normalized,
}

/// Largest normalized time produced by [`normalized_time`].
pub const NTIME_MAX: f32 = 1.0 - f32::EPSILON;

/// Converts real seconds into normalized clip time in `[0, 1)`.
///
/// The time is wrapped to the clip length in seconds and then rescaled by the
/// duration in ticks. Negative times wrap from the end of the clip.
#[must_use]
pub fn normalized_time(time: f32, duration_ticks: f32, ticks_per_second: f32) -> f32 {
    debug_assert!(duration_ticks > 0.0 && ticks_per_second > 0.0);

    let duration_sec = duration_ticks / ticks_per_second;
    let animtime_sec = time.rem_euclid(duration_sec);
    ((animtime_sec * ticks_per_second) / duration_ticks).clamp(0.0, NTIME_MAX)
}

/// Applies `format` to `time`: seconds are normalized, normalized time is
/// clamped into range.
#[must_use]
pub fn resolve_time(time: f32, format: TimeFormat, duration_ticks: f32, ticks_per_second: f32) -> f32 {
    match format {
        TimeFormat::Seconds => normalized_time(time, duration_ticks, ticks_per_second),
        TimeFormat::Normalized => time.clamp(0.0, NTIME_MAX),
    }
}
